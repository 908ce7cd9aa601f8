// SPDX-License-Identifier: Apache-2.0
//! Allocation data sources.
//!
//! The bucketed search runs over compact `u32` slots rather than asset
//! ids: pipes and nodes are numbered densely, and a source resolves slots
//! back to geometry, diameters, and original ids. Two sources exist: a
//! heap-backed [`NetworkSource`] built straight from the model, and the
//! packed byte-buffer form in [`buffer`](crate::buffer) used by the
//! parallel worker path. Both must produce identical allocations.

use aqueduct_geom::{Point, Segment};
use aqueduct_model::{Asset, AssetId, AssetType, Network};

/// Node role tag carried alongside packed node coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Demand node; eligible for customer assignment.
    Junction,
    /// Reservoir; never assigned customers.
    Reservoir,
    /// Tank; never assigned customers.
    Tank,
}

/// Read access to the slot-indexed network snapshot used by allocation.
pub trait AllocationSource {
    /// Number of pipe segments.
    fn segment_count(&self) -> u32;
    /// Geometry of segment `slot`.
    fn segment(&self, slot: u32) -> Segment;
    /// Pipe slot owning segment `slot`.
    fn segment_pipe(&self, slot: u32) -> u32;
    /// Diameter of pipe `pipe`.
    fn pipe_diameter(&self, pipe: u32) -> f64;
    /// Original id of pipe `pipe`.
    fn pipe_id(&self, pipe: u32) -> &AssetId;
    /// Endpoint node slots of pipe `pipe`.
    fn pipe_endpoints(&self, pipe: u32) -> (u32, u32);
    /// Role of node `slot`.
    fn node_kind(&self, slot: u32) -> NodeKind;
    /// Coordinate of node `slot`.
    fn node_position(&self, slot: u32) -> Point;
    /// Original id of node `slot`.
    fn node_id(&self, slot: u32) -> &AssetId;
}

/// Heap-backed allocation source: one segment record per pipe segment,
/// resolved eagerly from the model snapshot.
#[derive(Debug, Clone)]
pub struct NetworkSource {
    segments: Vec<Segment>,
    segment_pipes: Vec<u32>,
    pipe_ids: Vec<AssetId>,
    pipe_diameters: Vec<f64>,
    pipe_endpoints: Vec<(u32, u32)>,
    node_ids: Vec<AssetId>,
    node_kinds: Vec<NodeKind>,
    node_positions: Vec<Point>,
}

impl NetworkSource {
    /// Builds a source from the network's pipes and nodes.
    ///
    /// Pipes and nodes are numbered in deterministic id order. Only pipe
    /// links participate; pumps and valves are not allocation candidates.
    /// Pipes whose endpoints are missing from the model are skipped.
    #[must_use]
    pub fn from_network(network: &Network) -> Self {
        let mut node_ids = Vec::new();
        let mut node_kinds = Vec::new();
        let mut node_positions = Vec::new();
        let mut node_slots = rustc_hash::FxHashMap::default();
        for node in network.nodes() {
            let kind = match node.asset_type() {
                AssetType::Reservoir => NodeKind::Reservoir,
                AssetType::Tank => NodeKind::Tank,
                _ => NodeKind::Junction,
            };
            let Some(position) = node.position() else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation)] // slot space is u32 by design
            let slot = node_ids.len() as u32;
            node_slots.insert(node.id().clone(), slot);
            node_ids.push(node.id().clone());
            node_kinds.push(kind);
            node_positions.push(position);
        }

        let mut segments = Vec::new();
        let mut segment_pipes = Vec::new();
        let mut pipe_ids = Vec::new();
        let mut pipe_diameters = Vec::new();
        let mut pipe_endpoints = Vec::new();
        for asset in network.assets_of_type(AssetType::Pipe) {
            let Asset::Pipe(pipe) = asset else {
                continue;
            };
            let (Some(start), Some(end)) = (
                node_slots.get(&pipe.connections.0),
                node_slots.get(&pipe.connections.1),
            ) else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation)]
            let pipe_slot = pipe_ids.len() as u32;
            pipe_ids.push(pipe.id.clone());
            pipe_diameters.push(pipe.diameter);
            pipe_endpoints.push((*start, *end));
            for segment in pipe.vertices.segments() {
                segments.push(segment);
                segment_pipes.push(pipe_slot);
            }
        }

        Self {
            segments,
            segment_pipes,
            pipe_ids,
            pipe_diameters,
            pipe_endpoints,
            node_ids,
            node_kinds,
            node_positions,
        }
    }

    /// Number of pipes.
    #[must_use]
    pub fn pipe_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.pipe_ids.len() as u32;
        count
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.node_ids.len() as u32;
        count
    }
}

impl AllocationSource for NetworkSource {
    fn segment_count(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let count = self.segments.len() as u32;
        count
    }

    fn segment(&self, slot: u32) -> Segment {
        self.segments[slot as usize]
    }

    fn segment_pipe(&self, slot: u32) -> u32 {
        self.segment_pipes[slot as usize]
    }

    fn pipe_diameter(&self, pipe: u32) -> f64 {
        self.pipe_diameters[pipe as usize]
    }

    fn pipe_id(&self, pipe: u32) -> &AssetId {
        &self.pipe_ids[pipe as usize]
    }

    fn pipe_endpoints(&self, pipe: u32) -> (u32, u32) {
        self.pipe_endpoints[pipe as usize]
    }

    fn node_kind(&self, slot: u32) -> NodeKind {
        self.node_kinds[slot as usize]
    }

    fn node_position(&self, slot: u32) -> Point {
        self.node_positions[slot as usize]
    }

    fn node_id(&self, slot: u32) -> &AssetId {
        &self.node_ids[slot as usize]
    }
}
