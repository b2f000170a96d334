//! Interactive annotation sketching on a triangle-mesh surface.
//!
//! Pointer events become anchors, anchors become a [`ControlShape`] and the
//! shape is sampled into a polyline that hugs the surface. The
//! [`AnnotationSession`] owns that pipeline; [`SceneGeometry`] is its
//! renderable output.

mod config;
mod diagnostics;
mod error;
mod geometry;
mod projection;
mod sampler;
mod session;
mod shape;

pub use config::{
    DEFAULT_DENSITY, DEFAULT_RAY_LIFT, DEFAULT_SURFACE_OFFSET, DRAG_THRESHOLD, ProjectionMode,
    SamplingOptions, SessionConfig, ShapeKind,
};
pub use diagnostics::SamplingDiagnostics;
pub use error::{ConfigError, SketchError};
pub use geometry::{PolylineStatus, SceneGeometry, SceneItem, SceneKey};
pub use projection::{ProjectionStrategy, camera_facing_frame, shape_basis};
pub use sampler::{Annotation, SampledAnnotation, sample_annotation, sample_coords, step_count};
pub use session::{AnnotationSession, SessionEvent, SessionState, SketchContext};
pub use shape::{ControlShape, ShapeBasis, build_shape, circle, rectangle};
