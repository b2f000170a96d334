//! Local tangent coordinate frames anchored at surface points.
//!
//! A [`TangentFrame`] maps 2D `(u, v)` coordinates onto the plane tangent to a
//! surface at an anchor point, and back. Shapes drawn in tangent-plane mode
//! live in this 2D space until the sampler projects them onto the mesh.

use super::{Point3, Tolerance, Vec2, Vec3};

/// `|n · Y|` at or above this switches the default up hint from world-Y to world-X.
pub const UP_HINT_SWITCH: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("frame normal is zero or not finite")]
    DegenerateNormal,
    #[error("up hint is parallel to the frame normal")]
    DegenerateUpHint,
}

/// Orthonormal basis at a surface point.
///
/// `tangent_u`, `tangent_v` and `normal` are mutually orthogonal unit vectors.
/// Frames are immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentFrame {
    origin: Point3,
    normal: Vec3,
    tangent_u: Vec3,
    tangent_v: Vec3,
}

impl TangentFrame {
    /// Build a frame at `origin` using the default up hint.
    ///
    /// The hint is world-Y, or world-X when the normal is within
    /// [`UP_HINT_SWITCH`] of world-Y.
    pub fn new(origin: Point3, normal: Vec3) -> Result<Self, FrameError> {
        let n = normal.normalized().ok_or(FrameError::DegenerateNormal)?;
        let up = if n.dot(Vec3::Y).abs() >= UP_HINT_SWITCH {
            Vec3::X
        } else {
            Vec3::Y
        };
        Self::with_up(origin, n, up)
    }

    /// Build a frame with an explicit up hint.
    ///
    /// `tangent_u = normalize(up × n)`, `tangent_v = normalize(n × tangent_u)`.
    pub fn with_up(origin: Point3, normal: Vec3, up: Vec3) -> Result<Self, FrameError> {
        if !origin.is_finite() {
            return Err(FrameError::DegenerateNormal);
        }
        let n = normal.normalized().ok_or(FrameError::DegenerateNormal)?;
        let u = up.cross(n);
        if Tolerance::ZERO_LENGTH.is_zero_vec3(u) {
            return Err(FrameError::DegenerateUpHint);
        }
        let tangent_u = u.normalized().ok_or(FrameError::DegenerateUpHint)?;
        let tangent_v = n
            .cross(tangent_u)
            .normalized()
            .ok_or(FrameError::DegenerateNormal)?;

        Ok(Self {
            origin,
            normal: n,
            tangent_u,
            tangent_v,
        })
    }

    #[must_use]
    pub const fn origin(&self) -> Point3 {
        self.origin
    }

    #[must_use]
    pub const fn normal(&self) -> Vec3 {
        self.normal
    }

    #[must_use]
    pub const fn tangent_u(&self) -> Vec3 {
        self.tangent_u
    }

    #[must_use]
    pub const fn tangent_v(&self) -> Vec3 {
        self.tangent_v
    }

    /// `origin + tangent_u * coord.x + tangent_v * coord.y`.
    #[must_use]
    pub fn to_world(&self, coord: Vec2) -> Point3 {
        self.origin + self.tangent_u * coord.x + self.tangent_v * coord.y
    }

    /// Coordinates of an offset from the origin, projected onto the tangent plane.
    #[must_use]
    pub fn to_local(&self, offset: Vec3) -> Vec2 {
        Vec2::new(offset.dot(self.tangent_u), offset.dot(self.tangent_v))
    }

    /// Coordinates of a world point relative to the frame origin.
    #[must_use]
    pub fn local_of_point(&self, point: Point3) -> Vec2 {
        self.to_local(point - self.origin)
    }

    /// Unit 2D direction of a world direction projected onto the tangent plane.
    ///
    /// `None` when the direction is (nearly) parallel to the normal.
    #[must_use]
    pub fn local_direction(&self, direction: Vec3) -> Option<Vec2> {
        let local = self.to_local(direction);
        if local.length() <= Tolerance::LOOSE.eps {
            return None;
        }
        local.normalized()
    }

    /// Same frame with the normal (and `tangent_v`, to stay right-handed) flipped.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
            tangent_u: self.tangent_u,
            tangent_v: -self.tangent_v,
        }
    }

    /// True when the three axes are unit length and pairwise orthogonal within `tol`.
    #[must_use]
    pub fn is_orthonormal(&self, tol: Tolerance) -> bool {
        let axes = [self.tangent_u, self.tangent_v, self.normal];
        axes.iter().all(|a| tol.approx_eq_f64(a.length(), 1.0))
            && tol.approx_zero_f64(self.tangent_u.dot(self.tangent_v))
            && tol.approx_zero_f64(self.tangent_u.dot(self.normal))
            && tol.approx_zero_f64(self.tangent_v.dot(self.normal))
    }
}
