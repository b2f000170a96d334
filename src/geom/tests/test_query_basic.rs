use crate::geom::{MeshError, MeshSurface, Point3, SurfaceMesh, SurfaceQuery, Tolerance, Vec3};

fn unit_plane() -> MeshSurface {
    MeshSurface::new(SurfaceMesh::plane(2.0, 4)).expect("plane mesh")
}

fn viewer_torus() -> MeshSurface {
    MeshSurface::new(SurfaceMesh::torus(2.0, 1.0, 16, 32)).expect("torus mesh")
}

#[test]
fn plane_nearest_point_drops_onto_surface() {
    let surface = unit_plane();
    let hit = surface
        .nearest_surface_point(Point3::new(0.3, -0.2, 5.0))
        .expect("nearest");
    assert!(Tolerance::DEFAULT.approx_eq_point3(hit.position, Point3::new(0.3, -0.2, 0.0)));
    assert!(Tolerance::DEFAULT.approx_eq_f64(hit.normal.z, 1.0));

    let off_edge = surface
        .nearest_surface_point(Point3::new(3.0, 0.0, 1.0))
        .expect("nearest");
    assert!(Tolerance::DEFAULT.approx_eq_point3(off_edge.position, Point3::new(1.0, 0.0, 0.0)));
}

#[test]
fn nearest_point_rejects_non_finite_queries() {
    let surface = unit_plane();
    assert!(surface
        .nearest_surface_point(Point3::new(f64::NAN, 0.0, 0.0))
        .is_none());
}

#[test]
fn plane_cast_ray_hits_front_and_misses_backward() {
    let surface = unit_plane();
    let hit = surface
        .cast_ray(Point3::new(0.2, 0.3, 5.0), Vec3::new(0.0, 0.0, -2.0))
        .expect("hit");
    assert!(Tolerance::DEFAULT.approx_eq_point3(hit.position, Point3::new(0.2, 0.3, 0.0)));

    assert!(surface
        .cast_ray(Point3::new(0.2, 0.3, 5.0), Vec3::Z)
        .is_none());
    assert!(surface
        .cast_ray(Point3::new(5.0, 5.0, 5.0), -Vec3::Z)
        .is_none());
    assert!(surface
        .cast_ray(Point3::new(0.0, 0.0, 5.0), Vec3::ZERO)
        .is_none());
}

#[test]
fn cast_ray_returns_first_of_stacked_faces() {
    let mesh = SurfaceMesh::new(
        vec![
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
        vec![0, 1, 2, 3, 4, 5],
    );
    let surface = MeshSurface::new(mesh).expect("mesh");

    let from_above = surface
        .cast_ray(Point3::new(0.0, 0.0, 5.0), -Vec3::Z)
        .expect("hit");
    assert!(Tolerance::DEFAULT.approx_eq_f64(from_above.position.z, 1.0));

    let from_below = surface
        .cast_ray(Point3::new(0.0, 0.0, -5.0), Vec3::Z)
        .expect("hit");
    assert!(Tolerance::DEFAULT.approx_eq_f64(from_below.position.z, 0.0));
}

#[test]
fn torus_ray_hits_top_of_tube_and_passes_through_hole() {
    let surface = viewer_torus();
    let hit = surface
        .cast_ray(Point3::new(2.05, 0.03, 10.0), -Vec3::Z)
        .expect("tube hit");
    assert!(hit.position.z > 0.95, "{hit:?}");
    assert!(hit.normal.z > 0.9, "{hit:?}");

    assert!(surface
        .cast_ray(Point3::new(0.0, 0.0, 10.0), -Vec3::Z)
        .is_none());
}

#[test]
fn torus_nearest_point_faces_query() {
    let surface = viewer_torus();
    let hit = surface
        .nearest_surface_point(Point3::new(5.0, 0.0, 0.0))
        .expect("nearest");
    assert!((hit.position.distance_to(Point3::new(5.0, 0.0, 0.0)) - 2.0).abs() < 1e-3);
    assert!(hit.normal.x > 0.9, "{hit:?}");
    assert!(Tolerance::LOOSE.approx_eq_f64(hit.normal.length(), 1.0));
}

#[test]
fn mesh_surface_rejects_fully_degenerate_mesh() {
    let mesh = SurfaceMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]], vec![0, 1, 2]);
    assert_eq!(MeshSurface::new(mesh).err(), Some(MeshError::AllDegenerate));
}
