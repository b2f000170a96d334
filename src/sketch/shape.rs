//! Control shapes built from user anchors.
//!
//! Rectangles and circles are derived from exactly two anchors; polygons and
//! splines keep their anchors as-is. All coordinates are 2D and share the
//! space of the anchors (normalized screen or tangent-frame `(u, v)`).

use serde::Serialize;

use crate::geom::Vec2;

use super::config::{SessionConfig, ShapeKind};

/// Shape outline before it is sampled onto the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ControlShape {
    /// Closed loop `[pA, pB, pC, pD]`.
    Rectangle { corners: [Vec2; 4] },
    /// Axis-aligned ellipse.
    Circle { center: Vec2, rx: f64, ry: f64 },
    Polygon { vertices: Vec<Vec2>, closed: bool },
    /// Catmull-Rom control chain.
    Spline { controls: Vec<Vec2>, closed: bool },
}

impl ControlShape {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Rectangle { .. } | Self::Circle { .. } => true,
            Self::Polygon { closed, .. } | Self::Spline { closed, .. } => *closed,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Spline { .. } => ShapeKind::Spline,
        }
    }
}

/// Space-dependent inputs of the two-anchor generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeBasis {
    /// Direction the rectangle is aligned to when axis alignment is on.
    pub axis: Vec2,
    /// Width over height of the anchor space; `1.0` for tangent-frame anchors.
    pub aspect: f64,
}

impl Default for ShapeBasis {
    fn default() -> Self {
        Self {
            axis: Vec2::X,
            aspect: 1.0,
        }
    }
}

impl ShapeBasis {
    fn aspect(&self) -> f64 {
        if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        }
    }
}

/// Rectangle through `first` and `second`.
///
/// With `center_anchored`, `first` is the center and `second` a corner.
/// Coordinates are stretched by the aspect ratio on x while the corners are
/// built, so "square" means square on screen.
#[must_use]
pub fn rectangle(
    first: Vec2,
    second: Vec2,
    axis_aligned: bool,
    center_anchored: bool,
    basis: ShapeBasis,
) -> ControlShape {
    let aspect = basis.aspect();
    let p_c = second.scale_x(aspect);
    let p_a = if center_anchored {
        first.scale_x(aspect) * 2.0 - p_c
    } else {
        first.scale_x(aspect)
    };

    let (p_b, p_d) = if axis_aligned {
        let axis = basis.axis.scale_x(aspect);
        let p_b = p_a + axis.project(p_c - p_a);
        (p_b, p_a + p_c - p_b)
    } else {
        let a = p_c.x - p_a.x;
        let b = p_c.y - p_a.y;
        (
            p_a + Vec2::new((a - b) * 0.5, (a + b) * 0.5),
            p_a + Vec2::new((a + b) * 0.5, -(a - b) * 0.5),
        )
    };

    let inv = 1.0 / aspect;
    ControlShape::Rectangle {
        corners: [
            p_a.scale_x(inv),
            p_b.scale_x(inv),
            p_c.scale_x(inv),
            p_d.scale_x(inv),
        ],
    }
}

/// Ellipse whose extent is set by `first` and `second`.
///
/// The anchors are opposite rim points, or center and rim point with
/// `center_anchored`. The radius is measured in aspect-corrected space, so the
/// result is round on screen.
#[must_use]
pub fn circle(first: Vec2, second: Vec2, center_anchored: bool, basis: ShapeBasis) -> ControlShape {
    let aspect = basis.aspect();
    let a = first.scale_x(aspect);
    let b = second.scale_x(aspect);
    let (center, radius) = if center_anchored {
        (first, a.distance_to(b))
    } else {
        (first.midpoint(second), a.distance_to(b) * 0.5)
    };
    ControlShape::Circle {
        center,
        rx: radius / aspect,
        ry: radius,
    }
}

/// Build the control shape for `anchors` under `config`.
///
/// Two-anchor shapes need exactly two anchors and return `None` otherwise.
/// Polygons and splines accept any non-empty anchor list.
#[must_use]
pub fn build_shape(
    config: &SessionConfig,
    anchors: &[Vec2],
    closed: bool,
    basis: ShapeBasis,
) -> Option<ControlShape> {
    match (config.shape, anchors) {
        (ShapeKind::Rectangle, &[first, second]) => Some(rectangle(
            first,
            second,
            config.axis_aligned,
            config.center_anchored,
            basis,
        )),
        (ShapeKind::Circle, &[first, second]) => {
            Some(circle(first, second, config.center_anchored, basis))
        }
        (ShapeKind::Rectangle | ShapeKind::Circle, _) | (_, []) => None,
        (ShapeKind::Polygon, vertices) => Some(ControlShape::Polygon {
            vertices: vertices.to_vec(),
            closed,
        }),
        (ShapeKind::Spline, controls) => Some(ControlShape::Spline {
            controls: controls.to_vec(),
            closed,
        }),
    }
}
