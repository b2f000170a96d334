use crate::geom::bvh::Bvh;
use crate::geom::{BBox, Point3, Vec3};

fn unit_boxes_along_x() -> Vec<BBox> {
    vec![
        BBox::new(Point3::new(10.0, 0.0, 0.0), Point3::new(11.0, 1.0, 1.0)),
        BBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0)),
        BBox::new(Point3::new(-5.0, 0.0, 0.0), Point3::new(-4.0, 1.0, 1.0)),
        BBox::new(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 1.0, 1.0)),
    ]
}

#[test]
fn bvh_build_rejects_empty_input() {
    assert!(Bvh::build(&[]).is_none());
}

#[test]
fn bvh_closest_ray_hit_returns_first_box_along_ray() {
    let bboxes = unit_boxes_along_x();
    let bvh = Bvh::build_with_leaf_size(&bboxes, 1).expect("bvh build");

    let origin = Point3::new(-10.0, 0.5, 0.5);
    let dir = Vec3::new(1.0, 0.0, 0.0);
    let (idx, t) = bvh
        .closest_ray_hit(origin, dir, 0.0, f64::INFINITY, |prim| {
            Some(bboxes[prim].min.x - origin.x)
        })
        .expect("ray hit");

    assert_eq!(idx, 2);
    assert!((t - 5.0).abs() < 1e-12);
}

#[test]
fn bvh_closest_ray_hit_ignores_boxes_behind_origin() {
    let bboxes = unit_boxes_along_x();
    let bvh = Bvh::build_with_leaf_size(&bboxes, 1).expect("bvh build");

    let origin = Point3::new(3.0, 0.5, 0.5);
    let dir = Vec3::new(1.0, 0.0, 0.0);
    let (idx, _) = bvh
        .closest_ray_hit(origin, dir, 0.0, f64::INFINITY, |prim| {
            let t = bboxes[prim].min.x - origin.x;
            (t >= 0.0).then_some(t)
        })
        .expect("ray hit");
    assert_eq!(idx, 3);

    let miss = bvh.closest_ray_hit(origin, Vec3::new(0.0, 1.0, 0.0), 0.0, f64::INFINITY, |_| {
        Some(1.0)
    });
    assert!(miss.is_none());
}

#[test]
fn bvh_nearest_finds_closest_primitive() {
    let bboxes = unit_boxes_along_x();
    let bvh = Bvh::build_with_leaf_size(&bboxes, 1).expect("bvh build");
    let point = Point3::new(0.0, 0.5, 0.5);

    let (idx, dist2) = bvh
        .nearest(point, |prim| {
            Some(bboxes[prim].distance_squared_to_point(point))
        })
        .expect("nearest hit");

    assert_eq!(idx, 1);
    assert!((dist2 - 1.0).abs() < 1e-12);
}

#[test]
fn bvh_nearest_matches_brute_force_with_large_leaves() {
    let bboxes: Vec<BBox> = (0..64)
        .map(|i| {
            let x = f64::from(i) * 0.75;
            let y = f64::from(i % 7) - 3.0;
            BBox::new(Point3::new(x, y, 0.0), Point3::new(x + 0.5, y + 0.5, 0.5))
        })
        .collect();
    let bvh = Bvh::build(&bboxes).expect("bvh build");

    for query in [
        Point3::new(-3.0, 0.0, 0.0),
        Point3::new(12.3, 2.0, 4.0),
        Point3::new(50.0, -5.0, 1.0),
    ] {
        let (idx, dist2) = bvh
            .nearest(query, |prim| Some(bboxes[prim].distance_squared_to_point(query)))
            .expect("nearest hit");
        let brute = bboxes
            .iter()
            .map(|b| b.distance_squared_to_point(query))
            .fold(f64::INFINITY, f64::min);
        assert!((dist2 - brute).abs() < 1e-12, "query {query:?} picked {idx}");
    }
}
