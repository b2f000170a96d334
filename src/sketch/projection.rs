use crate::geom::{
    Camera, FrameError, Point3, SurfacePoint, SurfaceQuery, TangentFrame, TimingBucket, Vec2,
};

use super::config::ProjectionMode;
use super::shape::ShapeBasis;

/// Maps a 2D shape coordinate onto the surface.
///
/// Each variant carries exactly the data its projection needs, so a strategy is
/// a self-contained value that can be rebuilt and compared freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionStrategy {
    /// Coordinates are normalized screen positions; misses at silhouettes.
    ScreenSpace { camera: Camera },
    /// Coordinates are tangent-frame `(u, v)`; the plane point is lifted by
    /// `lift` along the frame normal and cast back down. Misses where the
    /// surface curves away from the plane faster than the lift.
    TangentCameraRay { frame: TangentFrame, lift: f64 },
    /// Coordinates are tangent-frame `(u, v)`, snapped to the closest surface
    /// point. Never misses but can fold onto itself on concave geometry.
    TangentNearestPoint { frame: TangentFrame },
}

impl ProjectionStrategy {
    /// Strategy for `mode`. Tangent modes need the frame of the shape being
    /// sampled and return `None` without one.
    #[must_use]
    pub fn for_mode(
        mode: ProjectionMode,
        frame: Option<TangentFrame>,
        camera: &Camera,
        lift: f64,
    ) -> Option<Self> {
        match mode {
            ProjectionMode::ScreenSpace => Some(Self::ScreenSpace { camera: *camera }),
            ProjectionMode::TangentCameraRay => {
                frame.map(|frame| Self::TangentCameraRay { frame, lift })
            }
            ProjectionMode::TangentNearestPoint => {
                frame.map(|frame| Self::TangentNearestPoint { frame })
            }
        }
    }

    #[must_use]
    pub fn mode(&self) -> ProjectionMode {
        match self {
            Self::ScreenSpace { .. } => ProjectionMode::ScreenSpace,
            Self::TangentCameraRay { .. } => ProjectionMode::TangentCameraRay,
            Self::TangentNearestPoint { .. } => ProjectionMode::TangentNearestPoint,
        }
    }

    #[must_use]
    pub fn frame(&self) -> Option<&TangentFrame> {
        match self {
            Self::ScreenSpace { .. } => None,
            Self::TangentCameraRay { frame, .. } | Self::TangentNearestPoint { frame } => {
                Some(frame)
            }
        }
    }

    /// Surface query this strategy spends its time in.
    #[must_use]
    pub fn timing_bucket(&self) -> TimingBucket {
        match self {
            Self::ScreenSpace { .. } | Self::TangentCameraRay { .. } => TimingBucket::RayCast,
            Self::TangentNearestPoint { .. } => TimingBucket::NearestPoint,
        }
    }

    pub fn project<Q>(&self, query: &Q, coord: Vec2) -> Option<SurfacePoint>
    where
        Q: SurfaceQuery + ?Sized,
    {
        match self {
            Self::ScreenSpace { camera } => camera.pick(query, coord),
            Self::TangentCameraRay { frame, lift } => {
                let origin = frame.to_world(coord) + frame.normal() * *lift;
                query.cast_ray(origin, -frame.normal())
            }
            Self::TangentNearestPoint { frame } => {
                query.nearest_surface_point(frame.to_world(coord))
            }
        }
    }
}

/// Tangent frame at `hit` with its normal turned toward `eye`.
///
/// Lifted rays start on the viewer's side of the surface, so a back-face hit
/// still yields a usable frame.
pub fn camera_facing_frame(hit: SurfacePoint, eye: Point3) -> Result<TangentFrame, FrameError> {
    let frame = TangentFrame::new(hit.position, hit.normal)?;
    if frame.normal().dot(eye - hit.position) < 0.0 {
        Ok(frame.flipped())
    } else {
        Ok(frame)
    }
}

/// Basis the two-anchor generators work in for the given anchor space.
///
/// Screen-space anchors are stretched by the camera aspect and align to screen
/// x. Tangent anchors are metric and align to the camera's right axis seen in
/// the frame plane, falling back to `u` when the camera looks along the plane.
#[must_use]
pub fn shape_basis(frame: Option<&TangentFrame>, camera: &Camera) -> ShapeBasis {
    match frame {
        None => ShapeBasis {
            axis: Vec2::X,
            aspect: camera.aspect(),
        },
        Some(frame) => ShapeBasis {
            axis: frame.local_direction(camera.right()).unwrap_or(Vec2::X),
            aspect: 1.0,
        },
    }
}
