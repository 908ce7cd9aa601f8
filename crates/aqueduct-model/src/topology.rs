// SPDX-License-Identifier: Apache-2.0
//! Adjacency index from node ids to incident link ids.
//!
//! The topology mirrors the link assets in the network: a link id appears
//! under both of its endpoint nodes iff the corresponding link asset is
//! present with connections. Replacing a link removes its old edges before
//! the new ones are added; the mutation engine drives that ordering.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::AssetId;

/// Node -> incident-link adjacency with a reverse endpoint index.
///
/// All operations are O(1) amortized. The reverse `endpoints` index makes
/// `remove_link` cheap without scanning every node bucket.
#[derive(Debug, Default, Clone)]
pub struct Topology {
    /// Node id -> ids of links touching it.
    incident: FxHashMap<AssetId, FxHashSet<AssetId>>,
    /// Link id -> (start node, end node).
    endpoints: FxHashMap<AssetId, (AssetId, AssetId)>,
}

impl Topology {
    /// Creates an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link between `start` and `end`.
    ///
    /// If the link is already present (possibly with different endpoints),
    /// its old edges are removed first so the link id stays unique.
    pub fn add_link(&mut self, link: AssetId, start: AssetId, end: AssetId) {
        if self.endpoints.contains_key(&link) {
            self.remove_link(&link);
        }
        self.incident
            .entry(start.clone())
            .or_default()
            .insert(link.clone());
        self.incident
            .entry(end.clone())
            .or_default()
            .insert(link.clone());
        self.endpoints.insert(link, (start, end));
    }

    /// Removes a link's edges. Returns `false` when the link was absent.
    pub fn remove_link(&mut self, link: &AssetId) -> bool {
        let Some((start, end)) = self.endpoints.remove(link) else {
            return false;
        };
        for node in [&start, &end] {
            let bucket_is_empty = self
                .incident
                .get_mut(node)
                .is_some_and(|links| {
                    links.remove(link);
                    links.is_empty()
                });
            if bucket_is_empty {
                self.incident.remove(node);
            }
        }
        true
    }

    /// Drops a node's adjacency bucket.
    ///
    /// Links still referencing the node keep their endpoint entries; the
    /// caller deletes those links in the same batch (the mutation engine
    /// removes every deleted id in both roles).
    pub fn remove_node(&mut self, node: &AssetId) {
        self.incident.remove(node);
    }

    /// Ids of links touching `node`.
    pub fn links(&self, node: &AssetId) -> impl Iterator<Item = &AssetId> {
        self.incident.get(node).into_iter().flatten()
    }

    /// Number of links touching `node`.
    #[must_use]
    pub fn degree(&self, node: &AssetId) -> usize {
        self.incident.get(node).map_or(0, FxHashSet::len)
    }

    /// Whether `link` has edges in the topology.
    #[must_use]
    pub fn has_link(&self, link: &AssetId) -> bool {
        self.endpoints.contains_key(link)
    }

    /// The link's endpoint nodes, when present.
    #[must_use]
    pub fn link_endpoints(&self, link: &AssetId) -> Option<(&AssetId, &AssetId)> {
        self.endpoints.get(link).map(|(s, e)| (s, e))
    }
}

/// Secondary index splitting asset ids by node/link role.
///
/// Backed by ordered sets so type-filtered iteration is deterministic.
#[derive(Debug, Default, Clone)]
pub struct AssetIndex {
    nodes: std::collections::BTreeSet<AssetId>,
    links: std::collections::BTreeSet<AssetId>,
}

impl AssetIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes an asset by its role.
    pub fn insert(&mut self, id: &AssetId, is_link: bool) {
        if is_link {
            self.links.insert(id.clone());
        } else {
            self.nodes.insert(id.clone());
        }
    }

    /// Removes an asset from whichever side holds it.
    pub fn remove(&mut self, id: &AssetId) {
        self.nodes.remove(id);
        self.links.remove(id);
    }

    /// Node ids in deterministic order.
    pub fn node_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.nodes.iter()
    }

    /// Link ids in deterministic order.
    pub fn link_ids(&self) -> impl Iterator<Item = &AssetId> {
        self.links.iter()
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of indexed links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
