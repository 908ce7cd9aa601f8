// SPDX-License-Identifier: Apache-2.0
//! Customer demand points and their pipe/junction lookup index.
//!
//! A customer point is an off-network demand location. It is created
//! disconnected; the allocation engine produces *connected copies* carrying
//! the pipe it snapped to, the assigned junction, the snap point, and the
//! distance. Connection changes always produce new instances: snapshots
//! held by undo history alias the old value and must never observe edits.

use std::collections::BTreeSet;

use aqueduct_geom::Point;
use rustc_hash::FxHashMap;

use crate::ident::{AssetId, CustomerPointId};

/// One demand entry on a customer point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomerDemand {
    /// Base demand contributed by this entry.
    pub base_demand: f64,
    /// Optional demand pattern reference.
    pub pattern_id: Option<String>,
}

/// The pipe/junction assignment of a connected customer point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomerConnection {
    /// The pipe the point snapped to.
    pub pipe_id: AssetId,
    /// The junction endpoint the demand is assigned to.
    pub junction_id: AssetId,
    /// Nearest point on the pipe's geometry.
    pub snap_point: Point,
    /// Euclidean distance from the customer point to the snap point.
    pub distance: f64,
}

/// An off-network demand point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomerPoint {
    /// Stable identifier.
    pub id: CustomerPointId,
    /// Location of the demand point.
    pub position: Point,
    /// Demand entries; the point's demand is their sum.
    pub demands: Vec<CustomerDemand>,
    /// Present when the point is allocated to the network.
    pub connection: Option<CustomerConnection>,
}

impl CustomerPoint {
    /// Creates a disconnected customer point.
    #[must_use]
    pub fn new(id: CustomerPointId, position: Point, demands: Vec<CustomerDemand>) -> Self {
        Self {
            id,
            position,
            demands,
            connection: None,
        }
    }

    /// Returns a connected copy; `self` is untouched.
    #[must_use]
    pub fn connect(&self, connection: CustomerConnection) -> Self {
        let mut copy = self.clone();
        copy.connection = Some(connection);
        copy
    }

    /// Returns a disconnected copy; `self` is untouched.
    #[must_use]
    pub fn disconnected(&self) -> Self {
        let mut copy = self.clone();
        copy.connection = None;
        copy
    }

    /// Sum of all demand entries.
    #[must_use]
    pub fn total_base_demand(&self) -> f64 {
        self.demands.iter().map(|d| d.base_demand).sum()
    }
}

/// Secondary index from pipes and junctions to connected customer points.
///
/// Kept in sync by the mutation engine whenever a customer point's
/// connection changes: the old connection's entries are removed before the
/// new ones are inserted. Buckets are ordered sets so iteration is
/// deterministic.
#[derive(Debug, Default, Clone)]
pub struct CustomerPointsLookup {
    by_pipe: FxHashMap<AssetId, BTreeSet<CustomerPointId>>,
    by_junction: FxHashMap<AssetId, BTreeSet<CustomerPointId>>,
}

impl CustomerPointsLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a point's connection, if any.
    pub fn insert(&mut self, point: &CustomerPoint) {
        let Some(connection) = &point.connection else {
            return;
        };
        self.by_pipe
            .entry(connection.pipe_id.clone())
            .or_default()
            .insert(point.id.clone());
        self.by_junction
            .entry(connection.junction_id.clone())
            .or_default()
            .insert(point.id.clone());
    }

    /// Removes a point's connection entries, if any.
    pub fn remove(&mut self, point: &CustomerPoint) {
        let Some(connection) = &point.connection else {
            return;
        };
        let pipe_empty = self
            .by_pipe
            .get_mut(&connection.pipe_id)
            .is_some_and(|bucket| {
                bucket.remove(&point.id);
                bucket.is_empty()
            });
        if pipe_empty {
            self.by_pipe.remove(&connection.pipe_id);
        }
        let junction_empty = self
            .by_junction
            .get_mut(&connection.junction_id)
            .is_some_and(|bucket| {
                bucket.remove(&point.id);
                bucket.is_empty()
            });
        if junction_empty {
            self.by_junction.remove(&connection.junction_id);
        }
    }

    /// Ids of points connected to `pipe`, in deterministic order.
    pub fn points_for_pipe(&self, pipe: &AssetId) -> impl Iterator<Item = &CustomerPointId> {
        self.by_pipe.get(pipe).into_iter().flatten()
    }

    /// Ids of points assigned to `junction`, in deterministic order.
    pub fn points_for_junction(
        &self,
        junction: &AssetId,
    ) -> impl Iterator<Item = &CustomerPointId> {
        self.by_junction.get(junction).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_point(id: &str, pipe: &str, junction: &str) -> CustomerPoint {
        CustomerPoint::new(
            CustomerPointId::from(id),
            Point::new(0.0, 0.0),
            vec![CustomerDemand {
                base_demand: 0.5,
                pattern_id: None,
            }],
        )
        .connect(CustomerConnection {
            pipe_id: AssetId::from(pipe),
            junction_id: AssetId::from(junction),
            snap_point: Point::new(1.0, 0.0),
            distance: 1.0,
        })
    }

    #[test]
    fn connect_produces_a_new_instance() {
        let original = CustomerPoint::new(
            CustomerPointId::from("c1"),
            Point::new(2.0, 3.0),
            vec![],
        );
        let connected = original.connect(CustomerConnection {
            pipe_id: AssetId::from("p1"),
            junction_id: AssetId::from("j1"),
            snap_point: Point::new(2.0, 0.0),
            distance: 3.0,
        });
        assert!(original.connection.is_none());
        assert!(connected.connection.is_some());
        assert!(connected.disconnected().connection.is_none());
    }

    #[test]
    fn total_demand_sums_entries() {
        let mut point = connected_point("c1", "p1", "j1");
        point.demands.push(CustomerDemand {
            base_demand: 1.5,
            pattern_id: Some("pat1".to_owned()),
        });
        assert!((point.total_base_demand() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn lookup_tracks_both_sides_and_cleans_buckets() {
        let mut lookup = CustomerPointsLookup::new();
        let a = connected_point("c1", "p1", "j1");
        let b = connected_point("c2", "p1", "j2");
        lookup.insert(&a);
        lookup.insert(&b);
        assert_eq!(lookup.points_for_pipe(&AssetId::from("p1")).count(), 2);
        assert_eq!(lookup.points_for_junction(&AssetId::from("j1")).count(), 1);

        lookup.remove(&a);
        assert_eq!(lookup.points_for_pipe(&AssetId::from("p1")).count(), 1);
        assert_eq!(lookup.points_for_junction(&AssetId::from("j1")).count(), 0);

        lookup.remove(&b);
        assert_eq!(lookup.points_for_pipe(&AssetId::from("p1")).count(), 0);
    }

    #[test]
    fn disconnected_points_are_not_indexed() {
        let mut lookup = CustomerPointsLookup::new();
        let point = CustomerPoint::new(
            CustomerPointId::from("c1"),
            Point::new(0.0, 0.0),
            vec![],
        );
        lookup.insert(&point);
        lookup.remove(&point);
        assert_eq!(lookup.points_for_pipe(&AssetId::from("p1")).count(), 0);
    }
}
