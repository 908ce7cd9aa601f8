// SPDX-License-Identifier: Apache-2.0
//! The in-memory network model.
//!
//! [`Network`] owns the assets map and every secondary structure derived
//! from it: the node/link index, the topology, the label registry, the
//! customer points and their lookup, and the coarse process-level state.
//! All mutation flows through [`apply_moment`](crate::engine::apply_moment);
//! the read API here never hands out mutable references.

use rustc_hash::FxHashMap;

use crate::asset::{Asset, AssetType};
use crate::customer::{CustomerPoint, CustomerPointsLookup};
use crate::ident::{AssetId, CustomerPointId};
use crate::label::LabelManager;
use crate::moment::{Curve, DemandScaling, EpsTiming};
use crate::topology::{AssetIndex, Topology};

/// The hydraulic network domain model.
#[derive(Debug, Default, Clone)]
pub struct Network {
    pub(crate) assets: FxHashMap<AssetId, Asset>,
    pub(crate) index: AssetIndex,
    pub(crate) topology: Topology,
    pub(crate) labels: LabelManager,
    pub(crate) customer_points: FxHashMap<CustomerPointId, CustomerPoint>,
    pub(crate) lookup: CustomerPointsLookup,
    pub(crate) curves: Vec<Curve>,
    pub(crate) demand_scaling: DemandScaling,
    pub(crate) eps_timing: EpsTiming,
    pub(crate) controls: String,
}

impl Network {
    /// Creates an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an asset by id.
    #[must_use]
    pub fn asset(&self, id: &AssetId) -> Option<&Asset> {
        self.assets.get(id)
    }

    /// Whether an asset with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    /// Total number of assets.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Node assets in deterministic id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Asset> {
        self.index.node_ids().filter_map(|id| self.assets.get(id))
    }

    /// Link assets in deterministic id order.
    pub fn links(&self) -> impl Iterator<Item = &Asset> {
        self.index.link_ids().filter_map(|id| self.assets.get(id))
    }

    /// Assets of one type in deterministic id order.
    pub fn assets_of_type(&self, asset_type: AssetType) -> impl Iterator<Item = &Asset> {
        let ids: Box<dyn Iterator<Item = &AssetId>> = if asset_type.is_link() {
            Box::new(self.index.link_ids())
        } else {
            Box::new(self.index.node_ids())
        };
        ids.filter_map(|id| self.assets.get(id))
            .filter(move |a| a.asset_type() == asset_type)
    }

    /// The adjacency index.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Ids of links touching `node`.
    pub fn links_at(&self, node: &AssetId) -> impl Iterator<Item = &AssetId> {
        self.topology.links(node)
    }

    /// The label registry.
    #[must_use]
    pub fn labels(&self) -> &LabelManager {
        &self.labels
    }

    /// Looks up a customer point by id.
    #[must_use]
    pub fn customer_point(&self, id: &CustomerPointId) -> Option<&CustomerPoint> {
        self.customer_points.get(id)
    }

    /// Number of customer points.
    #[must_use]
    pub fn customer_point_count(&self) -> usize {
        self.customer_points.len()
    }

    /// All customer points (unordered).
    pub fn customer_points(&self) -> impl Iterator<Item = &CustomerPoint> {
        self.customer_points.values()
    }

    /// Customer points connected to `pipe`, in deterministic id order.
    pub fn customer_points_for_pipe(
        &self,
        pipe: &AssetId,
    ) -> impl Iterator<Item = &CustomerPoint> {
        self.lookup
            .points_for_pipe(pipe)
            .filter_map(|id| self.customer_points.get(id))
    }

    /// Customer points assigned to `junction`, in deterministic id order.
    pub fn customer_points_for_junction(
        &self,
        junction: &AssetId,
    ) -> impl Iterator<Item = &CustomerPoint> {
        self.lookup
            .points_for_junction(junction)
            .filter_map(|id| self.customer_points.get(id))
    }

    /// The model's curve set.
    #[must_use]
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Global demand scaling.
    #[must_use]
    pub fn demand_scaling(&self) -> DemandScaling {
        self.demand_scaling
    }

    /// EPS timing settings.
    #[must_use]
    pub fn eps_timing(&self) -> EpsTiming {
        self.eps_timing
    }

    /// Raw controls text.
    #[must_use]
    pub fn controls(&self) -> &str {
        &self.controls
    }
}
