//! Renderable value objects produced by a session.
//!
//! A [`SceneGeometry`] is a full snapshot: every tick rebuilds it from session
//! state, and a presentation layer diffs consecutive snapshots by [`SceneKey`].

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::Serialize;

use crate::geom::Point3;

use super::sampler::Annotation;

/// Stable identity of a scene item across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneKey {
    Annotation(u64),
    Preview,
    Markers,
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annotation(id) => write!(f, "annotation-{id}"),
            Self::Preview => f.write_str("preview"),
            Self::Markers => f.write_str("markers"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PolylineStatus {
    Committed,
    /// Finished shape awaiting commit or cancel.
    Live,
    /// Follows the pointer; replaced on every move.
    Preview,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SceneItem {
    Polyline {
        points: Vec<[f64; 3]>,
        closed: bool,
        status: PolylineStatus,
    },
    Markers {
        points: Vec<[f64; 3]>,
    },
}

impl SceneItem {
    #[must_use]
    pub fn polyline(annotation: &Annotation, status: PolylineStatus) -> Self {
        Self::Polyline {
            points: annotation.points().iter().map(|p| p.to_array()).collect(),
            closed: annotation.is_closed(),
            status,
        }
    }

    #[must_use]
    pub fn markers(points: &[Point3]) -> Self {
        Self::Markers {
            points: points.iter().map(|p| p.to_array()).collect(),
        }
    }

    #[must_use]
    pub fn points(&self) -> &[[f64; 3]] {
        match self {
            Self::Polyline { points, .. } | Self::Markers { points } => points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneGeometry {
    items: BTreeMap<SceneKey, SceneItem>,
}

impl SceneGeometry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item` under `key`. Empty items are never rendered and are dropped.
    pub fn insert(&mut self, key: SceneKey, item: SceneItem) {
        if item.points().is_empty() {
            return;
        }
        self.items.insert(key, item);
    }

    #[must_use]
    pub fn get(&self, key: SceneKey) -> Option<&SceneItem> {
        self.items.get(&key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, SceneKey, SceneItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Polylines with the given status, in key order.
    pub fn polylines(&self, wanted: PolylineStatus) -> impl Iterator<Item = (SceneKey, &SceneItem)> {
        self.items.iter().filter_map(move |(key, item)| match item {
            SceneItem::Polyline { status, .. } if *status == wanted => Some((*key, item)),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a SceneGeometry {
    type Item = (&'a SceneKey, &'a SceneItem);
    type IntoIter = btree_map::Iter<'a, SceneKey, SceneItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_items_are_dropped() {
        let mut scene = SceneGeometry::new();
        scene.insert(
            SceneKey::Preview,
            SceneItem::polyline(&Annotation::default(), PolylineStatus::Preview),
        );
        scene.insert(SceneKey::Markers, SceneItem::markers(&[]));
        assert!(scene.is_empty());
    }

    #[test]
    fn keys_order_annotations_before_transient_items() {
        let mut scene = SceneGeometry::new();
        let line = Annotation::new(vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)], false);
        scene.insert(SceneKey::Markers, SceneItem::markers(&[Point3::ORIGIN]));
        scene.insert(SceneKey::Preview, SceneItem::polyline(&line, PolylineStatus::Preview));
        scene.insert(SceneKey::Annotation(7), SceneItem::polyline(&line, PolylineStatus::Live));
        scene.insert(SceneKey::Annotation(2), SceneItem::polyline(&line, PolylineStatus::Committed));

        let keys: Vec<String> = scene.iter().map(|(key, _)| key.to_string()).collect();
        assert_eq!(keys, ["annotation-2", "annotation-7", "preview", "markers"]);
        assert_eq!(scene.polylines(PolylineStatus::Live).count(), 1);
        assert_eq!(
            scene.get(SceneKey::Annotation(2)).map(|item| item.points().len()),
            Some(2)
        );
    }
}
