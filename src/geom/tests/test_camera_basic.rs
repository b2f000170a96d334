use crate::geom::{
    Camera, CameraError, CameraSettings, MeshSurface, Point3, SurfaceMesh, Tolerance, Vec2, Vec3,
};

#[test]
fn default_camera_looks_down_negative_z() {
    let camera = Camera::default();
    assert_eq!(camera.eye(), Point3::new(0.0, 0.0, 5.0));
    assert!(Tolerance::DEFAULT.approx_eq_f64(camera.forward().dot(-Vec3::Z), 1.0));
    assert!(Tolerance::DEFAULT.approx_eq_f64(camera.right().dot(Vec3::X), 1.0));

    let ray = camera.ray_through(Vec2::ZERO).expect("ray");
    assert_eq!(ray.origin, camera.eye());
    assert!(Tolerance::DEFAULT.approx_eq_f64(ray.direction.dot(-Vec3::Z), 1.0));
}

#[test]
fn camera_matches_constructed_default() {
    let built = Camera::new(CameraSettings::default()).expect("camera");
    assert_eq!(built, Camera::default());
}

#[test]
fn ray_through_and_project_round_trip() {
    let camera = Camera::new(CameraSettings {
        eye: [3.0, 2.0, 4.0],
        target: [0.0, 0.5, 0.0],
        aspect: 1.6,
        ..CameraSettings::default()
    })
    .expect("camera");

    for ndc in [Vec2::new(0.3, -0.4), Vec2::new(-0.9, 0.8), Vec2::ZERO] {
        let ray = camera.ray_through(ndc).expect("ray");
        let point = ray.origin + ray.direction * 3.5;
        let back = camera.project_to_ndc(point).expect("in front of camera");
        assert!(Tolerance::LOOSE.approx_eq_vec2(back, ndc), "{ndc:?} -> {back:?}");
    }
}

#[test]
fn screen_edge_ray_respects_fov_and_aspect() {
    let camera = Camera::new(CameraSettings {
        aspect: 2.0,
        ..CameraSettings::default()
    })
    .expect("camera");
    let ray = camera.ray_through(Vec2::new(1.0, 0.0)).expect("ray");
    let expected = (35.0_f64.to_radians().tan() * 2.0).atan();
    let angle = ray.direction.dot(camera.forward()).acos();
    assert!((angle - expected).abs() < 1e-9);
}

#[test]
fn project_rejects_points_behind_eye() {
    let camera = Camera::default();
    assert!(camera.project_to_ndc(Point3::new(0.0, 0.0, 6.0)).is_none());
    assert!(camera.project_to_ndc(Point3::new(0.0, 0.0, 5.0)).is_none());
}

#[test]
fn invalid_settings_are_rejected() {
    let bad_fov = CameraSettings {
        fov_degrees: 0.0,
        ..CameraSettings::default()
    };
    assert_eq!(Camera::new(bad_fov), Err(CameraError::InvalidFov(0.0)));

    let bad_aspect = CameraSettings {
        aspect: -1.0,
        ..CameraSettings::default()
    };
    assert_eq!(Camera::new(bad_aspect), Err(CameraError::InvalidAspect(-1.0)));

    let degenerate = CameraSettings {
        target: [0.0, 0.0, 5.0],
        ..CameraSettings::default()
    };
    assert_eq!(Camera::new(degenerate), Err(CameraError::DegenerateView));
}

#[test]
fn clip_range_is_validated() {
    for (near, far) in [(0.0, 10.0), (-1.0, 10.0), (2.0, 2.0), (3.0, 1.0), (0.1, f64::INFINITY)] {
        let settings = CameraSettings {
            near,
            far,
            ..CameraSettings::default()
        };
        assert_eq!(
            Camera::new(settings),
            Err(CameraError::InvalidClip { near, far })
        );
    }
}

#[test]
fn pick_keeps_hits_inside_clip_range() {
    let surface = MeshSurface::new(SurfaceMesh::plane(2.0, 4)).expect("plane");
    let camera = Camera::default();
    let hit = camera.pick(&surface, Vec2::ZERO).expect("plane at depth 5");
    assert!(Tolerance::DEFAULT.approx_eq_point3(hit.position, Point3::ORIGIN));

    let short = Camera::new(CameraSettings {
        far: 4.0,
        ..CameraSettings::default()
    })
    .expect("camera");
    assert!(short.pick(&surface, Vec2::ZERO).is_none());

    let deep = Camera::new(CameraSettings {
        near: 6.0,
        far: 20.0,
        ..CameraSettings::default()
    })
    .expect("camera");
    assert!(deep.pick(&surface, Vec2::ZERO).is_none());
}
