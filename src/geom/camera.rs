use serde::{Deserialize, Serialize};

use super::{Point3, SurfacePoint, SurfaceQuery, Transform, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("camera eye and target coincide or up is parallel to the view direction")]
    DegenerateView,
    #[error("camera field of view must be in (0, 180) degrees, got {0}")]
    InvalidFov(f64),
    #[error("camera aspect ratio must be positive and finite, got {0}")]
    InvalidAspect(f64),
    #[error("camera clip range must satisfy 0 < near < far, got near {near} and far {far}")]
    InvalidClip { near: f64, far: f64 },
}

/// Camera parameters as supplied by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraSettings {
    pub eye: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
    pub fov_degrees: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 70.0,
            aspect: 1.0,
            near: 0.01,
            far: 10.0,
        }
    }
}

/// A pick ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
}

/// Perspective camera used to turn normalized screen coordinates into world
/// rays and world points back into screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    settings: CameraSettings,
    camera_to_world: Transform,
    world_to_camera: Transform,
    tan_half_fov: f64,
}

impl Camera {
    pub fn new(settings: CameraSettings) -> Result<Self, CameraError> {
        if !(settings.fov_degrees > 0.0 && settings.fov_degrees < 180.0) {
            return Err(CameraError::InvalidFov(settings.fov_degrees));
        }
        if !(settings.aspect.is_finite() && settings.aspect > 0.0) {
            return Err(CameraError::InvalidAspect(settings.aspect));
        }
        let (near, far) = (settings.near, settings.far);
        if !(near > 0.0 && near < far && far.is_finite()) {
            return Err(CameraError::InvalidClip { near, far });
        }
        let camera_to_world = Transform::look_at(
            Point3::from(settings.eye),
            Point3::from(settings.target),
            Vec3::from(settings.up),
        )
        .ok_or(CameraError::DegenerateView)?;

        Ok(Self {
            settings,
            camera_to_world,
            world_to_camera: camera_to_world.rigid_inverse(),
            tan_half_fov: (settings.fov_degrees.to_radians() * 0.5).tan(),
        })
    }

    #[must_use]
    pub fn settings(&self) -> CameraSettings {
        self.settings
    }

    #[must_use]
    pub fn eye(&self) -> Point3 {
        Point3::from(self.settings.eye)
    }

    /// Viewport width over height.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        self.settings.aspect
    }

    /// Unit world direction of the screen's +x axis.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.camera_to_world.axis(0)
    }

    /// Unit world direction the camera looks at.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        -self.camera_to_world.axis(2)
    }

    /// World-space ray from the eye through a normalized screen coordinate.
    #[must_use]
    pub fn ray_through(&self, ndc: Vec2) -> Option<Ray> {
        if !ndc.is_finite() {
            return None;
        }
        let local = Vec3::new(
            ndc.x * self.tan_half_fov * self.settings.aspect,
            ndc.y * self.tan_half_fov,
            -1.0,
        );
        let direction = self.camera_to_world.apply_vec(local).normalized()?;
        Some(Ray {
            origin: self.eye(),
            direction,
        })
    }

    /// First surface hit under a normalized screen coordinate whose view depth
    /// lies within `[near, far]`.
    pub fn pick<Q: SurfaceQuery + ?Sized>(&self, query: &Q, ndc: Vec2) -> Option<SurfacePoint> {
        let ray = self.ray_through(ndc)?;
        let hit = query.cast_ray(ray.origin, ray.direction)?;
        let depth = (hit.position - ray.origin).dot(self.forward());
        (depth >= self.settings.near && depth <= self.settings.far).then_some(hit)
    }

    /// Normalized screen coordinate of a world point, `None` when the point is
    /// behind the eye.
    #[must_use]
    pub fn project_to_ndc(&self, point: Point3) -> Option<Vec2> {
        let local = self.world_to_camera.apply_point(point);
        let depth = -local.z;
        if !depth.is_finite() || depth <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            local.x / (depth * self.tan_half_fov * self.settings.aspect),
            local.y / (depth * self.tan_half_fov),
        ))
    }
}

impl Default for Camera {
    fn default() -> Self {
        let settings = CameraSettings::default();
        let camera_to_world = Transform::look_at(
            Point3::from(settings.eye),
            Point3::from(settings.target),
            Vec3::from(settings.up),
        )
        .unwrap_or_default();
        Self {
            settings,
            camera_to_world,
            world_to_camera: camera_to_world.rigid_inverse(),
            tan_half_fov: (settings.fov_degrees.to_radians() * 0.5).tan(),
        }
    }
}
