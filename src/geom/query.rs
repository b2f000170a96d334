//! Surface queries against a triangle mesh.
//!
//! The sketching core only ever talks to a mesh through [`SurfaceQuery`]: a
//! closest-point query and a first-hit ray cast. [`MeshSurface`] implements it
//! on top of a BVH over the mesh triangles.

use super::bvh::Bvh;
use super::mesh::{MeshError, SurfaceMesh};
use super::{BBox, Point3, Tolerance, Vec3};

/// A point on the surface with the unit normal of the triangle it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Point3,
    pub normal: Vec3,
}

impl SurfacePoint {
    /// `position + normal * distance`.
    #[must_use]
    pub fn lifted(&self, distance: f64) -> Point3 {
        self.position + self.normal * distance
    }
}

/// Read-only surface queries. Implementors are shared across sampling
/// threads when the `parallel` feature is on.
pub trait SurfaceQuery: Sync {
    /// Closest surface point to `point`.
    ///
    /// Over a non-empty mesh this is `Some` for every finite `point`.
    fn nearest_surface_point(&self, point: Point3) -> Option<SurfacePoint>;

    /// First intersection of the ray with the surface, `None` on a miss.
    ///
    /// Only hits at or in front of `origin` count; overlapping faces resolve to
    /// the hit closest along the ray.
    fn cast_ray(&self, origin: Point3, direction: Vec3) -> Option<SurfacePoint>;
}

impl<T: SurfaceQuery + ?Sized> SurfaceQuery for &T {
    fn nearest_surface_point(&self, point: Point3) -> Option<SurfacePoint> {
        (**self).nearest_surface_point(point)
    }

    fn cast_ray(&self, origin: Point3, direction: Vec3) -> Option<SurfacePoint> {
        (**self).cast_ray(origin, direction)
    }
}

/// A validated mesh with its spatial index.
#[derive(Debug, Clone)]
pub struct MeshSurface {
    mesh: SurfaceMesh,
    /// Triangles that survived degeneracy filtering, with unit face normals.
    triangles: Vec<IndexedTriangle>,
    bvh: Bvh,
    bbox: BBox,
    tol: Tolerance,
}

#[derive(Debug, Clone, Copy)]
struct IndexedTriangle {
    corners: [Point3; 3],
    normal: Vec3,
}

impl MeshSurface {
    pub fn new(mesh: SurfaceMesh) -> Result<Self, MeshError> {
        Self::with_tolerance(mesh, Tolerance::DEFAULT)
    }

    pub fn with_tolerance(mesh: SurfaceMesh, tol: Tolerance) -> Result<Self, MeshError> {
        mesh.validate()?;

        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        let mut bboxes = Vec::with_capacity(mesh.triangle_count());
        for tri in 0..mesh.triangle_count() {
            let Some(normal) = mesh.face_normal(tri).normalized() else {
                continue;
            };
            let corners = mesh.triangle(tri);
            let Some(bbox) = BBox::from_points(&corners) else {
                continue;
            };
            triangles.push(IndexedTriangle { corners, normal });
            bboxes.push(bbox.expand_by(tol.eps));
        }

        let skipped = mesh.triangle_count() - triangles.len();
        if skipped > 0 {
            log::debug!("skipped {skipped} degenerate triangles while indexing mesh");
        }

        let bvh = Bvh::build(&bboxes).ok_or(MeshError::AllDegenerate)?;
        let bbox = bboxes
            .iter()
            .copied()
            .reduce(BBox::union)
            .ok_or(MeshError::AllDegenerate)?;

        log::debug!(
            "indexed mesh: {} vertices, {} triangles",
            mesh.vertex_count(),
            triangles.len()
        );

        Ok(Self {
            mesh,
            triangles,
            bvh,
            bbox,
            tol,
        })
    }

    #[must_use]
    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    #[must_use]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl SurfaceQuery for MeshSurface {
    fn nearest_surface_point(&self, point: Point3) -> Option<SurfacePoint> {
        if !point.is_finite() {
            return None;
        }
        let (prim, _) = self.bvh.nearest(point, |idx| {
            let closest = closest_point_on_triangle(point, self.triangles[idx].corners);
            Some(point.distance_squared_to(closest))
        })?;
        let triangle = self.triangles[prim];
        Some(SurfacePoint {
            position: closest_point_on_triangle(point, triangle.corners),
            normal: triangle.normal,
        })
    }

    fn cast_ray(&self, origin: Point3, direction: Vec3) -> Option<SurfacePoint> {
        let dir = direction.normalized()?;
        if !origin.is_finite() {
            return None;
        }
        let (prim, t) = self.bvh.closest_ray_hit(origin, dir, 0.0, f64::INFINITY, |idx| {
            ray_triangle_intersection(origin, dir, self.triangles[idx].corners, self.tol)
        })?;
        Some(SurfacePoint {
            position: origin + dir * t,
            normal: self.triangles[prim].normal,
        })
    }
}

/// Möller–Trumbore ray/triangle test. Returns the ray parameter of the hit.
fn ray_triangle_intersection(
    origin: Point3,
    dir: Vec3,
    [a, b, c]: [Point3; 3],
    tol: Tolerance,
) -> Option<f64> {
    let edge1 = b - a;
    let edge2 = c - a;
    let h = dir.cross(edge2);
    let det = edge1.dot(h);
    let det_eps = tol.eps * edge1.length() * h.length();
    if !det.is_finite() || det.abs() <= det_eps {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = inv_det * s.dot(h);
    if u < -tol.eps || u > 1.0 + tol.eps {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * dir.dot(q);
    if v < -tol.eps || u + v > 1.0 + tol.eps {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    if !t.is_finite() || t < 0.0 {
        return None;
    }
    Some(t)
}

/// Closest point on a triangle by Voronoi-region classification.
fn closest_point_on_triangle(p: Point3, [a, b, c]: [Point3; 3]) -> Point3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}
