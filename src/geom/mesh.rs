use std::f64::consts::TAU;

use super::{Point3, Vec3};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no triangles")]
    Empty,
    #[error("mesh indices are not a triangle list (len % 3 != 0)")]
    NotTriangles,
    #[error("mesh has out-of-bounds vertex index {index} (vertex count {vertex_count})")]
    InvalidIndex { index: u32, vertex_count: usize },
    #[error("mesh has invalid vertex coordinates (NaN/Inf) at vertex {0}")]
    NonFinite(usize),
    #[error("flat position buffer length {0} is not a multiple of 3")]
    FlatBufferLength(usize),
    #[error("every triangle of the mesh is degenerate")]
    AllDegenerate,
}

/// Indexed triangle mesh the sketches are drawn on.
///
/// The mesh is read-only once handed to a [`MeshSurface`](super::MeshSurface).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Build a mesh from a packed `[x0, y0, z0, x1, ...]` buffer, as handed over
    /// by JS typed arrays.
    pub fn from_flat(positions: &[f64], indices: Vec<u32>) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::FlatBufferLength(positions.len()));
        }
        let positions = positions
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        let mesh = Self::new(positions, indices);
        mesh.validate()?;
        Ok(mesh)
    }

    /// Square grid in the XY plane centered at the origin, facing +Z.
    #[must_use]
    pub fn plane(size: f64, divisions: usize) -> Self {
        let divisions = divisions.max(1);
        let half = size * 0.5;
        grid_mesh(divisions, divisions, |s, t| {
            [-half + s * size, -half + t * size, 0.0]
        })
    }

    /// Torus around the Z axis with outward-facing triangles.
    ///
    /// `radius` is the distance from the center to the tube center, `tube` the
    /// tube radius. `radial_segments` subdivides the tube cross-section,
    /// `tubular_segments` the sweep around the Z axis.
    #[must_use]
    pub fn torus(radius: f64, tube: f64, radial_segments: usize, tubular_segments: usize) -> Self {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);
        grid_mesh(tubular, radial, |s, t| {
            let u = s * TAU;
            let v = t * TAU;
            let ring = radius + tube * v.cos();
            [ring * u.cos(), ring * u.sin(), tube * v.sin()]
        })
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles);
        }
        if self.indices.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(bad) = self
            .positions
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(MeshError::NonFinite(bad));
        }
        let vertex_count = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::InvalidIndex {
                index,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Corner positions of triangle `tri`. Callers must have validated the mesh.
    #[must_use]
    pub(crate) fn triangle(&self, tri: usize) -> [Point3; 3] {
        let base = tri * 3;
        [
            Point3::from(self.positions[self.indices[base] as usize]),
            Point3::from(self.positions[self.indices[base + 1] as usize]),
            Point3::from(self.positions[self.indices[base + 2] as usize]),
        ]
    }

    /// Unnormalized face normal following the winding order.
    #[must_use]
    pub(crate) fn face_normal(&self, tri: usize) -> Vec3 {
        let [a, b, c] = self.triangle(tri);
        (b - a).cross(c - a)
    }
}

/// Regular `(nu + 1) x (nv + 1)` vertex grid, two triangles per cell, wound
/// counter-clockwise around `∂u × ∂v`. Grids that wrap (torus) keep their seam
/// vertices duplicated.
fn grid_mesh<F>(nu: usize, nv: usize, position: F) -> SurfaceMesh
where
    F: Fn(f64, f64) -> [f64; 3],
{
    let mut positions = Vec::with_capacity((nu + 1) * (nv + 1));
    for j in 0..=nv {
        for i in 0..=nu {
            positions.push(position(i as f64 / nu as f64, j as f64 / nv as f64));
        }
    }

    let stride = (nu + 1) as u32;
    let mut indices = Vec::with_capacity(nu * nv * 6);
    for j in 0..nv as u32 {
        for i in 0..nu as u32 {
            let a = j * stride + i;
            let b = a + 1;
            let c = b + stride;
            let d = a + stride;
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    SurfaceMesh::new(positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_faces_point_up() {
        let mesh = SurfaceMesh::plane(2.0, 4);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 32);
        assert_eq!(mesh.vertex_count(), 25);
        for tri in 0..mesh.triangle_count() {
            let n = mesh.face_normal(tri).normalized().unwrap();
            assert!((n.z - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn torus_faces_point_outward() {
        let mesh = SurfaceMesh::torus(2.0, 1.0, 16, 32);
        assert!(mesh.validate().is_ok());
        for tri in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(tri);
            let centroid = Point3::new(
                (a.x + b.x + c.x) / 3.0,
                (a.y + b.y + c.y) / 3.0,
                (a.z + b.z + c.z) / 3.0,
            );
            let ring = Vec3::new(centroid.x, centroid.y, 0.0).normalized().unwrap() * 2.0;
            let outward = centroid - Point3::new(ring.x, ring.y, 0.0);
            assert!(mesh.face_normal(tri).dot(outward) > 0.0, "triangle {tri} faces inward");
        }
    }

    #[test]
    fn validate_reports_bad_buffers() {
        assert_eq!(SurfaceMesh::default().validate(), Err(MeshError::Empty));
        assert_eq!(
            SurfaceMesh::new(vec![[0.0; 3]; 3], vec![0, 1]).validate(),
            Err(MeshError::NotTriangles)
        );
        assert_eq!(
            SurfaceMesh::new(vec![[0.0; 3]; 3], vec![0, 1, 3]).validate(),
            Err(MeshError::InvalidIndex {
                index: 3,
                vertex_count: 3
            })
        );
        assert_eq!(
            SurfaceMesh::new(vec![[0.0, f64::NAN, 0.0]; 3], vec![0, 1, 2]).validate(),
            Err(MeshError::NonFinite(0))
        );
        assert_eq!(
            SurfaceMesh::from_flat(&[0.0; 4], vec![0, 1, 2]),
            Err(MeshError::FlatBufferLength(4))
        );
    }
}
