//! Geometry kernel: vector math, tangent frames, the camera model and surface
//! queries over an indexed triangle mesh.

mod bvh;
mod camera;
mod core;
mod frame;
mod mesh;
mod metrics;
mod query;

pub use camera::{Camera, CameraError, CameraSettings, Ray};
pub use core::{BBox, Point3, Tolerance, Transform, Vec2, Vec3};
pub use frame::{FrameError, TangentFrame, UP_HINT_SWITCH};
pub use mesh::{MeshError, SurfaceMesh};
pub use metrics::{SketchMetrics, SketchTimingReport, TimingBucket};
pub use query::{MeshSurface, SurfacePoint, SurfaceQuery};

#[cfg(test)]
mod tests;
