//! Sparse, index-addressed track points of a line or route.
//!
//! The server streams geometry in pieces: every push carries points with
//! their absolute index, and later pushes may fill gaps, overwrite points or
//! (with `reset`) start over. [`TrackPoints::merge`] folds one such batch into
//! the known set.

use std::collections::BTreeMap;

use facilmap_protocol::types::TrackPoint;
use serde::{Serialize, Serializer};

/// Track points keyed by index, with the logical length of the sequence.
///
/// `len()` is always one more than the highest populated index, or `0`.
/// Indexes below it may be missing while points are still streaming in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackPoints {
    points: BTreeMap<usize, TrackPoint>,
    length: usize,
}

impl TrackPoints {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `existing` (or start empty) and write every incoming point to its
    /// index. Later points win over earlier ones with the same index.
    #[must_use]
    pub fn merge(existing: Option<&TrackPoints>, incoming: &[TrackPoint]) -> TrackPoints {
        let mut points = existing.map(|tp| tp.points.clone()).unwrap_or_default();
        for point in incoming {
            points.insert(point.idx, *point);
        }
        let length = points.last_key_value().map_or(0, |(idx, _)| idx + 1);
        TrackPoints { points, length }
    }

    /// Logical length: highest populated index plus one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of indexes that actually hold a point.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&TrackPoint> {
        self.points.get(&idx)
    }

    /// Known points in index order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackPoint> {
        self.points.values()
    }

    /// Anything with fewer than two points must be treated as deleted, not drawn.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }
}

impl FromIterator<TrackPoint> for TrackPoints {
    fn from_iter<I: IntoIterator<Item = TrackPoint>>(iter: I) -> Self {
        let incoming: Vec<TrackPoint> = iter.into_iter().collect();
        Self::merge(None, &incoming)
    }
}

impl Serialize for TrackPoints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.points.values())
    }
}

#[cfg(test)]
#[path = "track_points_test.rs"]
mod tests;
