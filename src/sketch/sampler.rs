//! Arc-length sampling of control shapes and projection onto the surface.
//!
//! Sampling happens in two steps: [`sample_coords`] walks a [`ControlShape`]
//! in its own 2D space at a fixed density, then [`sample_annotation`] projects
//! each coordinate through a [`ProjectionStrategy`]. Both steps are pure, so
//! identical inputs always produce identical polylines.

use std::f64::consts::TAU;

use serde::Serialize;

use crate::geom::{Point3, SketchMetrics, SurfacePoint, SurfaceQuery, TimingBucket, Tolerance, Vec2};

use super::config::SamplingOptions;
use super::diagnostics::SamplingDiagnostics;
use super::projection::ProjectionStrategy;
use super::shape::ControlShape;

/// Catmull-Rom tension for a uniform spline through the control points.
const SPLINE_TENSION: f64 = 0.5;

/// Sampled polyline on the surface. Replaced, never edited, on every refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Annotation {
    points: Vec<Point3>,
    closed: bool,
}

impl Annotation {
    #[must_use]
    pub fn new(points: Vec<Point3>, closed: bool) -> Self {
        Self { points, closed }
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// The renderer joins the last point back to the first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampledAnnotation {
    pub annotation: Annotation,
    pub diagnostics: SamplingDiagnostics,
}

/// Number of uniform steps for a span of `length`.
///
/// Always at least one, so degenerate spans still evaluate their start.
#[must_use]
pub fn step_count(density: f64, length: f64) -> usize {
    let steps = (density * length).ceil();
    if steps.is_finite() && steps >= 1.0 {
        steps as usize
    } else {
        1
    }
}

/// 2D sample coordinates along `shape`, `density` samples per unit length.
#[must_use]
pub fn sample_coords(shape: &ControlShape, density: f64) -> Vec<Vec2> {
    match shape {
        ControlShape::Rectangle { corners } => sample_chain(corners, true, density),
        ControlShape::Circle { center, rx, ry } => sample_ellipse(*center, *rx, *ry, density),
        ControlShape::Polygon { vertices, closed } => sample_chain(vertices, *closed, density),
        ControlShape::Spline { controls, closed } => sample_spline(controls, *closed, density),
    }
}

/// Sample `shape` and project every coordinate onto the surface.
///
/// Misses leave gaps and are counted in the diagnostics; they never abort the
/// pass. Output points are lifted by `options.surface_offset` along the hit
/// normal.
pub fn sample_annotation<Q>(
    shape: &ControlShape,
    strategy: &ProjectionStrategy,
    query: &Q,
    options: &SamplingOptions,
    metrics: &mut SketchMetrics,
) -> SampledAnnotation
where
    Q: SurfaceQuery + ?Sized,
{
    let mut pass = SketchMetrics::default();
    pass.begin();
    let coords = pass.time(TimingBucket::Sampling, || {
        sample_coords(shape, options.density)
    });
    let hits = pass.time(strategy.timing_bucket(), || {
        project_coords(&coords, strategy, query)
    });
    let timing = pass.end();
    metrics.absorb(timing.as_ref());

    let mut diagnostics = SamplingDiagnostics::new();
    diagnostics.timing = timing;
    let mut points = Vec::with_capacity(hits.len());
    for hit in hits {
        diagnostics.record(hit.is_some());
        if let Some(hit) = hit {
            points.push(hit.lifted(options.surface_offset));
        }
    }

    if diagnostics.is_empty() {
        diagnostics.add_warning(format!("{} shape missed the surface entirely", shape.kind()));
    } else if !diagnostics.is_complete() {
        diagnostics.add_warning(format!(
            "{} of {} samples missed the surface",
            diagnostics.missed_count, diagnostics.evaluated_count
        ));
    }
    log::debug!("sampled {} ({})", shape.kind(), diagnostics.summary());

    SampledAnnotation {
        annotation: Annotation::new(points, shape.is_closed()),
        diagnostics,
    }
}

#[cfg(not(feature = "parallel"))]
fn project_coords<Q>(coords: &[Vec2], strategy: &ProjectionStrategy, query: &Q) -> Vec<Option<SurfacePoint>>
where
    Q: SurfaceQuery + ?Sized,
{
    coords
        .iter()
        .map(|&coord| strategy.project(query, coord))
        .collect()
}

#[cfg(feature = "parallel")]
fn project_coords<Q>(coords: &[Vec2], strategy: &ProjectionStrategy, query: &Q) -> Vec<Option<SurfacePoint>>
where
    Q: SurfaceQuery + ?Sized,
{
    use rayon::prelude::*;

    // Indexed collect keeps sample order.
    coords
        .par_iter()
        .map(|&coord| strategy.project(query, coord))
        .collect()
}

/// Uniform samples along a chain of straight segments.
///
/// Every segment contributes `t = i / n` for `i` in `[0, n)`. An open chain
/// also gets its final vertex unless that repeats the previous sample.
fn sample_chain(vertices: &[Vec2], closed: bool, density: f64) -> Vec<Vec2> {
    let Some((&first, _)) = vertices.split_first() else {
        return Vec::new();
    };
    if vertices.len() == 1 {
        return vec![first];
    }

    let segment_count = if closed {
        vertices.len()
    } else {
        vertices.len() - 1
    };

    let mut coords = Vec::new();
    for i in 0..segment_count {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let n = step_count(density, a.distance_to(b));
        coords.extend((0..n).map(|k| a.lerp(b, k as f64 / n as f64)));
    }

    if !closed {
        push_end(&mut coords, vertices[vertices.len() - 1]);
    }
    coords
}

fn sample_ellipse(center: Vec2, rx: f64, ry: f64, density: f64) -> Vec<Vec2> {
    let n = step_count(density, rx.abs() * TAU);
    (0..n)
        .map(|i| {
            let theta = TAU * i as f64 / n as f64;
            center + Vec2::new(rx * theta.cos(), ry * theta.sin())
        })
        .collect()
}

/// Uniform Catmull-Rom through `controls`.
///
/// The step count comes from the control polygon length; the curve parameter
/// is spread evenly over the spans.
fn sample_spline(controls: &[Vec2], closed: bool, density: f64) -> Vec<Vec2> {
    let count = controls.len();
    if count < 2 {
        return controls.to_vec();
    }

    let span_count = if closed { count } else { count - 1 };
    let length: f64 = (0..span_count)
        .map(|i| controls[i].distance_to(controls[(i + 1) % count]))
        .sum();
    let n = step_count(density, length);

    let control = |index: isize| -> Vec2 {
        if closed {
            controls[index.rem_euclid(count as isize) as usize]
        } else {
            controls[index.clamp(0, count as isize - 1) as usize]
        }
    };

    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let s = i as f64 / n as f64 * span_count as f64;
        let span = (s.floor() as usize).min(span_count - 1);
        let t = s - span as f64;
        let span = span as isize;
        coords.push(catmull_rom(
            control(span - 1),
            control(span),
            control(span + 1),
            control(span + 2),
            t,
        ));
    }

    if !closed {
        push_end(&mut coords, controls[count - 1]);
    }
    coords
}

fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f64) -> Vec2 {
    let tau = SPLINE_TENSION;
    let t2 = t * t;
    let t3 = t2 * t;

    let b0 = -tau * t3 + 2.0 * tau * t2 - tau * t;
    let b1 = (2.0 - tau) * t3 + (tau - 3.0) * t2 + 1.0;
    let b2 = (tau - 2.0) * t3 + (3.0 - 2.0 * tau) * t2 + tau * t;
    let b3 = tau * t3 - tau * t2;

    p0 * b0 + p1 * b1 + p2 * b2 + p3 * b3
}

fn push_end(coords: &mut Vec<Vec2>, end: Vec2) {
    let repeats = coords
        .last()
        .is_some_and(|&last| Tolerance::ZERO_LENGTH.approx_eq_vec2(last, end));
    if !repeats {
        coords.push(end);
    }
}
