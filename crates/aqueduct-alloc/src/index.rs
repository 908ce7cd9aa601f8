// SPDX-License-Identifier: Apache-2.0
//! R-tree over pipe segments.
//!
//! Entries carry the segment geometry inline alongside its `u32` slot so
//! candidate filtering never goes back to the source for coordinates.

use aqueduct_geom::{Point, Segment};
use rstar::{RTree, RTreeObject, AABB};

use crate::source::AllocationSource;

#[derive(Debug, Clone, Copy)]
struct SegmentEntry {
    slot: u32,
    segment: Segment,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let aabb = self.segment.aabb();
        AABB::from_corners([aabb.min_x, aabb.min_y], [aabb.max_x, aabb.max_y])
    }
}

/// Spatial index over every pipe segment of an allocation source.
#[derive(Debug)]
pub struct SegmentIndex {
    tree: RTree<SegmentEntry>,
}

impl SegmentIndex {
    /// Bulk-loads the index from all segments of `source`.
    #[must_use]
    pub fn build<S: AllocationSource>(source: &S) -> Self {
        let entries: Vec<SegmentEntry> = (0..source.segment_count())
            .map(|slot| SegmentEntry {
                slot,
                segment: source.segment(slot),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Segments whose envelope intersects the square of half-width
    /// `radius` centered on `center`. Callers refine with exact
    /// point-to-segment distance; the envelope test can over-approximate.
    pub fn candidates_within(
        &self,
        center: Point,
        radius: f64,
    ) -> impl Iterator<Item = (u32, Segment)> + '_ {
        let bucket = aqueduct_geom::Aabb::from_center_radius(center, radius);
        let envelope = AABB::from_corners([bucket.min_x, bucket.min_y], [bucket.max_x, bucket.max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| (entry.slot, entry.segment))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]

    use aqueduct_geom::{LineString, Point};
    use aqueduct_model::{apply_moment, ops, AssetId, Network};

    use super::*;
    use crate::source::NetworkSource;

    fn add_junction(network: &mut Network, id: &str, x: f64, y: f64) {
        let moment = ops::add_junction(network, AssetId::from(id), Point::new(x, y), 0.0, 0.0)
            .unwrap_or_else(|e| panic!("junction: {e}"));
        apply_moment(network, &moment);
    }

    fn add_pipe(network: &mut Network, id: &str, start: &str, end: &str, vertices: Option<LineString>) {
        let moment = ops::add_pipe(
            network,
            AssetId::from(id),
            AssetId::from(start),
            AssetId::from(end),
            vertices,
            300.0,
            100.0,
        )
        .unwrap_or_else(|e| panic!("pipe: {e}"));
        apply_moment(network, &moment);
    }

    fn two_pipe_network() -> Network {
        let mut network = Network::default();
        add_junction(&mut network, "j1", 0.0, 0.0);
        add_junction(&mut network, "j2", 100.0, 0.0);
        add_junction(&mut network, "j3", 0.0, 500.0);
        add_junction(&mut network, "j4", 100.0, 500.0);
        add_pipe(&mut network, "p1", "j1", "j2", None);
        add_pipe(&mut network, "p2", "j3", "j4", None);
        network
    }

    #[test]
    fn query_returns_only_nearby_segments() {
        let network = two_pipe_network();
        let source = NetworkSource::from_network(&network);
        let index = SegmentIndex::build(&source);
        assert_eq!(index.len(), 2);

        let hits: Vec<_> = index.candidates_within(Point::new(50.0, 10.0), 30.0).collect();
        assert_eq!(hits.len(), 1);
        let (slot, segment) = hits[0];
        assert_eq!(source.pipe_id(source.segment_pipe(slot)).as_str(), "p1");
        assert!((segment.start.y).abs() < 1e-9);
    }

    #[test]
    fn query_far_from_everything_is_empty() {
        let network = two_pipe_network();
        let source = NetworkSource::from_network(&network);
        let index = SegmentIndex::build(&source);
        assert!(index
            .candidates_within(Point::new(5000.0, 5000.0), 60.0)
            .next()
            .is_none());
    }

    #[test]
    fn multi_vertex_pipe_indexes_each_segment() {
        let mut network = Network::default();
        add_junction(&mut network, "j1", 0.0, 0.0);
        add_junction(&mut network, "j2", 200.0, 0.0);
        let bend = LineString::new(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(200.0, 0.0),
        ])
        .unwrap_or_else(|e| panic!("vertices: {e}"));
        add_pipe(&mut network, "p1", "j1", "j2", Some(bend));

        let source = NetworkSource::from_network(&network);
        let index = SegmentIndex::build(&source);
        assert_eq!(index.len(), 2);
    }
}
