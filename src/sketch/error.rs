use crate::geom::FrameError;

use super::config::ShapeKind;

/// Reasons a configuration change is refused. The previous configuration stays
/// active whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("chained drawing only applies to rectangles and circles, not {0}")]
    ChainedShape(ShapeKind),
    #[error("sampling density must be positive and finite, got {0}")]
    InvalidDensity(f64),
    #[error("surface offset must be finite and non-negative, got {0}")]
    InvalidSurfaceOffset(f64),
    #[error("ray lift must be positive and finite, got {0}")]
    InvalidRayLift(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SketchError {
    #[error("cannot anchor a tangent frame: {0}")]
    DegenerateFrame(#[from] FrameError),
    #[error("pointer ray does not hit the surface")]
    NoIntersection,
    #[error("invalid mode combination: {0}")]
    InvalidModeCombination(#[from] ConfigError),
    #[error("annotation has no points on the surface")]
    EmptyAnnotation,
}
