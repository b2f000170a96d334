use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Samples per unit length along a shape outline.
pub const DEFAULT_DENSITY: f64 = 20.0;
/// Distance sampled points are lifted off the surface along its normal.
pub const DEFAULT_SURFACE_OFFSET: f64 = 0.01;
/// Height above the tangent plane from which lifted rays are cast back down.
pub const DEFAULT_RAY_LIFT: f64 = 1.0;
/// Pointer travel in normalized screen units that turns a press into a drag.
pub const DRAG_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Polygon,
    Spline,
}

impl ShapeKind {
    pub const ALL: [Self; 4] = [Self::Rectangle, Self::Circle, Self::Polygon, Self::Spline];

    /// Rectangles and circles are fully defined by two anchors.
    #[must_use]
    pub const fn is_two_anchor(self) -> bool {
        matches!(self, Self::Rectangle | Self::Circle)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Polygon => "polygon",
            Self::Spline => "spline",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How 2D shape coordinates are turned into surface points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionMode {
    /// Coordinates are normalized screen positions, cast through the camera.
    #[default]
    ScreenSpace,
    /// Coordinates live in a tangent frame and are cast back down its normal.
    TangentCameraRay,
    /// Coordinates live in a tangent frame and snap to the closest surface point.
    TangentNearestPoint,
}

impl ProjectionMode {
    pub const ALL: [Self; 3] = [
        Self::ScreenSpace,
        Self::TangentCameraRay,
        Self::TangentNearestPoint,
    ];

    #[must_use]
    pub const fn uses_tangent_frame(self) -> bool {
        !matches!(self, Self::ScreenSpace)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScreenSpace => "screen-space",
            Self::TangentCameraRay => "tangent-camera-ray",
            Self::TangentNearestPoint => "tangent-nearest-point",
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The drawing toggles. A value is immutable; the session swaps whole configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub shape: ShapeKind,
    pub projection: ProjectionMode,
    /// The first anchor is the shape center instead of a corner/rim point.
    pub center_anchored: bool,
    /// Rectangles follow the camera's screen-right axis.
    pub axis_aligned: bool,
    /// The second anchor of a finished rectangle/circle starts the next one.
    pub chained: bool,
}

impl SessionConfig {
    #[must_use]
    pub fn new(shape: ShapeKind, projection: ProjectionMode) -> Self {
        Self {
            shape,
            projection,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_center_anchored(mut self, on: bool) -> Self {
        self.center_anchored = on;
        self
    }

    #[must_use]
    pub fn with_axis_aligned(mut self, on: bool) -> Self {
        self.axis_aligned = on;
        self
    }

    #[must_use]
    pub fn with_chained(mut self, on: bool) -> Self {
        self.chained = on;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chained && !self.shape.is_two_anchor() {
            return Err(ConfigError::ChainedShape(self.shape));
        }
        Ok(())
    }

    /// True when switching from `self` to `next` must discard the shape being
    /// drawn. Only the chaining toggle can change mid-gesture.
    #[must_use]
    pub fn invalidates(&self, next: &Self) -> bool {
        self.shape != next.shape
            || self.projection != next.projection
            || self.center_anchored != next.center_anchored
            || self.axis_aligned != next.axis_aligned
    }
}

/// Resolution and offsets used when sampling shapes onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingOptions {
    pub density: f64,
    pub surface_offset: f64,
    pub ray_lift: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            surface_offset: DEFAULT_SURFACE_OFFSET,
            ray_lift: DEFAULT_RAY_LIFT,
        }
    }
}

impl SamplingOptions {
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(ConfigError::InvalidDensity(self.density));
        }
        if !(self.surface_offset.is_finite() && self.surface_offset >= 0.0) {
            return Err(ConfigError::InvalidSurfaceOffset(self.surface_offset));
        }
        if !(self.ray_lift.is_finite() && self.ray_lift > 0.0) {
            return Err(ConfigError::InvalidRayLift(self.ray_lift));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chaining_requires_two_anchor_shape() {
        for shape in ShapeKind::ALL {
            let config = SessionConfig::new(shape, ProjectionMode::ScreenSpace).with_chained(true);
            assert_eq!(config.validate().is_ok(), shape.is_two_anchor(), "{shape}");
        }
        assert_eq!(
            SessionConfig::new(ShapeKind::Spline, ProjectionMode::ScreenSpace)
                .with_chained(true)
                .validate(),
            Err(ConfigError::ChainedShape(ShapeKind::Spline))
        );
    }

    #[test]
    fn only_chaining_survives_mid_gesture() {
        let base = SessionConfig::default();
        assert!(!base.invalidates(&base.with_chained(true)));
        assert!(base.invalidates(&base.with_axis_aligned(true)));
        assert!(base.invalidates(&base.with_center_anchored(true)));
        assert!(base.invalidates(&SessionConfig::new(
            ShapeKind::Circle,
            ProjectionMode::ScreenSpace
        )));
        assert!(base.invalidates(&SessionConfig::new(
            ShapeKind::Rectangle,
            ProjectionMode::TangentNearestPoint
        )));
    }

    #[test]
    fn sampling_options_reject_bad_values() {
        assert!(SamplingOptions::default().validate().is_ok());
        assert_eq!(
            SamplingOptions::default().with_density(0.0).validate(),
            Err(ConfigError::InvalidDensity(0.0))
        );
        let offset = SamplingOptions {
            surface_offset: -1.0,
            ..SamplingOptions::default()
        };
        assert_eq!(offset.validate(), Err(ConfigError::InvalidSurfaceOffset(-1.0)));
        let lift = SamplingOptions {
            ray_lift: f64::NAN,
            ..SamplingOptions::default()
        };
        assert!(matches!(lift.validate(), Err(ConfigError::InvalidRayLift(_))));
    }
}
