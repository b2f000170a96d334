use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{BBox, Point3, Vec3};

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: BBox,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl BvhNode {
    const fn leaf(bbox: BBox, start: u32, count: u32) -> Self {
        Self {
            bbox,
            left: u32::MAX,
            right: u32::MAX,
            start,
            count,
        }
    }

    const fn inner(bbox: BBox, left: u32, right: u32) -> Self {
        Self {
            bbox,
            left,
            right,
            start: 0,
            count: 0,
        }
    }

    const fn is_leaf(self) -> bool {
        self.count != 0
    }
}

/// Bounding volume hierarchy over primitive bounding boxes.
///
/// The tree only knows boxes; callers resolve exact primitive distances through
/// the closures passed to [`Bvh::closest_ray_hit`] and [`Bvh::nearest`].
#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<u32>,
}

impl Bvh {
    const DEFAULT_LEAF_SIZE: usize = 8;

    #[must_use]
    pub(crate) fn build(bboxes: &[BBox]) -> Option<Self> {
        Self::build_with_leaf_size(bboxes, Self::DEFAULT_LEAF_SIZE)
    }

    #[must_use]
    pub(crate) fn build_with_leaf_size(bboxes: &[BBox], leaf_size: usize) -> Option<Self> {
        if bboxes.is_empty() {
            return None;
        }

        let leaf_size = leaf_size.clamp(1, 256);
        let prim_indices: Vec<u32> = (0..(bboxes.len() as u32)).collect();
        let nodes = Vec::with_capacity(bboxes.len().saturating_mul(2));

        let mut bvh = Self { nodes, prim_indices };
        bvh.build_node(bboxes, 0, bboxes.len(), leaf_size);
        Some(bvh)
    }

    fn build_node(&mut self, bboxes: &[BBox], start: usize, end: usize, leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let bbox = self.range_bbox(bboxes, start, end);
        self.nodes.push(BvhNode::leaf(bbox, start as u32, (end - start) as u32));

        let count = end - start;
        if count <= leaf_size {
            return node_index;
        }

        let axis = self.choose_split_axis(bboxes, start, end);
        let mid = start + count / 2;
        self.prim_indices[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = centroid_component(bboxes[*a as usize], axis);
            let cb = centroid_component(bboxes[*b as usize], axis);
            ca.total_cmp(&cb)
        });

        let left = self.build_node(bboxes, start, mid, leaf_size);
        let right = self.build_node(bboxes, mid, end, leaf_size);
        self.nodes[node_index as usize] = BvhNode::inner(bbox, left, right);
        node_index
    }

    fn range_bbox(&self, bboxes: &[BBox], start: usize, end: usize) -> BBox {
        self.prim_indices[(start + 1)..end]
            .iter()
            .fold(bboxes[self.prim_indices[start] as usize], |acc, &idx| {
                acc.union(bboxes[idx as usize])
            })
    }

    fn choose_split_axis(&self, bboxes: &[BBox], start: usize, end: usize) -> u8 {
        let first = bboxes[self.prim_indices[start] as usize].center();
        let extent = self.prim_indices[(start + 1)..end]
            .iter()
            .fold(BBox::new(first, first), |acc, &idx| {
                acc.expand_point(bboxes[idx as usize].center())
            })
            .size();

        if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        }
    }

    /// Closest primitive hit along a ray.
    ///
    /// `hit_distance` returns the ray parameter of the hit with a primitive, or
    /// `None` on a miss. Subtrees whose box is entered beyond the best hit found
    /// so far are skipped. Returns `(primitive, t)`.
    pub(crate) fn closest_ray_hit<F>(
        &self,
        origin: Point3,
        dir: Vec3,
        t_min: f64,
        t_max: f64,
        mut hit_distance: F,
    ) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut best: Option<(usize, f64)> = None;
        let mut best_t = t_max;
        let mut stack = vec![0u32];

        while let Some(node_idx) = stack.pop() {
            let node = self.nodes[node_idx as usize];
            if ray_enters_bbox(origin, dir, node.bbox, t_min, best_t).is_none() {
                continue;
            }

            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    let Some(t) = hit_distance(prim as usize) else {
                        continue;
                    };
                    if t.is_finite() && t >= t_min && t < best_t {
                        best_t = t;
                        best = Some((prim as usize, t));
                    }
                }
                continue;
            }

            // Visit the nearer child first so the far one is more likely pruned.
            let near_left = ray_enters_bbox(origin, dir, self.nodes[node.left as usize].bbox, t_min, best_t);
            let near_right =
                ray_enters_bbox(origin, dir, self.nodes[node.right as usize].bbox, t_min, best_t);
            match (near_left, near_right) {
                (Some(l), Some(r)) if l <= r => {
                    stack.push(node.right);
                    stack.push(node.left);
                }
                (Some(_), Some(_)) => {
                    stack.push(node.left);
                    stack.push(node.right);
                }
                (Some(_), None) => stack.push(node.left),
                (None, Some(_)) => stack.push(node.right),
                (None, None) => {}
            }
        }

        best
    }

    /// Nearest primitive to `point`, best-first over box distances.
    ///
    /// `distance_to_prim` returns the squared distance from `point` to a
    /// primitive. Returns `(primitive, squared distance)`.
    pub(crate) fn nearest<F>(&self, point: Point3, mut distance_to_prim: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut best_dist2 = f64::INFINITY;
        let mut best_prim: Option<usize> = None;

        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist2: self.nodes[0].bbox.distance_squared_to_point(point),
            node: 0u32,
        });

        while let Some(entry) = heap.pop() {
            if !entry.dist2.is_finite() || entry.dist2 > best_dist2 {
                break;
            }

            let node = self.nodes[entry.node as usize];
            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    let prim_idx = prim as usize;
                    let Some(d2) = distance_to_prim(prim_idx) else {
                        continue;
                    };
                    if d2.is_finite() && d2 < best_dist2 {
                        best_dist2 = d2;
                        best_prim = Some(prim_idx);
                    }
                }
                continue;
            }

            for child in [node.left, node.right] {
                let dist2 = self.nodes[child as usize].bbox.distance_squared_to_point(point);
                if dist2 <= best_dist2 {
                    heap.push(HeapEntry { dist2, node: child });
                }
            }
        }

        best_prim.map(|idx| (idx, best_dist2))
    }
}

fn centroid_component(bbox: BBox, axis: u8) -> f64 {
    let c = bbox.center();
    match axis {
        0 => c.x,
        1 => c.y,
        _ => c.z,
    }
}

/// Slab test. Returns the entry parameter when the ray overlaps the box within
/// `[t_min, t_max]`.
fn ray_enters_bbox(origin: Point3, dir: Vec3, bbox: BBox, t_min: f64, t_max: f64) -> Option<f64> {
    let mut tmin = t_min;
    let mut tmax = t_max;
    let eps = 1e-15;

    for (o, d, min, max) in [
        (origin.x, dir.x, bbox.min.x, bbox.max.x),
        (origin.y, dir.y, bbox.min.y, bbox.max.y),
        (origin.z, dir.z, bbox.min.z, bbox.max.z),
    ] {
        if !o.is_finite() || !d.is_finite() {
            return None;
        }

        if d.abs() <= eps {
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let inv_d = 1.0 / d;
        let mut t0 = (min - o) * inv_d;
        let mut t1 = (max - o) * inv_d;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmax < tmin {
            return None;
        }
    }

    Some(tmin)
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist2: f64,
    node: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap acts as a min-heap on dist2.
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| self.node.cmp(&other.node))
    }
}
