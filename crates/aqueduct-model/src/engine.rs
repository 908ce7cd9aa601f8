// SPDX-License-Identifier: Apache-2.0
//! The moment mutation engine.
//!
//! [`apply_moment`] applies a batch to the network atomically — assets map,
//! asset index, topology, label registry, customer lookup, and coarse
//! process-level state move together — and returns the exact inverse batch.
//! Applying that reverse moment to the post-state restores the pre-state
//! (the round-trip law), which is what undo is.
//!
//! The engine assumes a *well-formed* moment. Ids referenced by deletes
//! need not exist (deletes of absent ids are no-ops), but puts must
//! reference link endpoints that exist or arrive in the same batch. The
//! engine does not validate this: it is the undo/redo hot path, and
//! re-applying a reverse moment must never fail. Validation lives with the
//! moment producers in [`ops`](crate::ops), the single place user input
//! enters the model.

use rustc_hash::FxHashSet;

use crate::ident::{AssetId, CustomerPointId};
use crate::moment::Moment;
use crate::network::Network;

/// Applies `moment` to `network` and returns the reverse moment.
///
/// Phases run in a fixed order that preserves the topology invariant:
///
/// 1. Asset deletes: each id is removed from the assets map, the index,
///    the topology (in both node and link roles), and the label registry.
///    The deleted asset becomes a reverse put.
/// 2. Asset puts: an existing version first has its topology edges and
///    label removed, so a link whose endpoints changed leaves no stale
///    edges behind. The new version is inserted, indexed, wired into the
///    topology when it is a link, and its label registered. The reverse
///    collects the old version as a put, or a delete when the id was new;
///    when a batch puts the same id more than once, only the first
///    occurrence contributes to the reverse.
/// 3. Customer point deletes, then puts: lookup entries for the old
///    connection are removed before the new connection is indexed; the
///    reverse captures prior values symmetrically to assets.
/// 4. Coarse puts (curves, demand scaling, EPS timing, controls):
///    whole-value replacement, with the prior whole value in the reverse.
pub fn apply_moment(network: &mut Network, moment: &Moment) -> Moment {
    let mut reverse = Moment::new(moment.note.clone());

    // Phase 1: asset deletes.
    for id in &moment.delete_assets {
        let Some(old) = network.assets.remove(id) else {
            continue;
        };
        network.index.remove(id);
        network.topology.remove_node(id);
        network.topology.remove_link(id);
        network.labels.remove(old.asset_type(), old.label());
        reverse.put_assets.push(old);
    }

    // Phase 2: asset puts. The reverse captures each id's prior value once,
    // at its first occurrence: a later put of the same id within this
    // moment replaces an intermediate value the reverse must not restore.
    let mut reversed_assets: FxHashSet<AssetId> = FxHashSet::default();
    for asset in &moment.put_assets {
        let id = asset.id().clone();
        let first = reversed_assets.insert(id.clone());
        if let Some(old) = network.assets.get(&id).cloned() {
            // Strip the old version's derived state before the new version
            // lands; a link whose endpoints changed must not leave stale
            // edges under its former nodes.
            if old.is_link() {
                network.topology.remove_link(&id);
            }
            network.labels.remove(old.asset_type(), old.label());
            network.index.remove(&id);
            if first {
                reverse.put_assets.push(old);
            }
        } else if first {
            reverse.delete_assets.push(id.clone());
        }
        network.index.insert(&id, asset.is_link());
        if let Some((start, end)) = asset.connections() {
            network
                .topology
                .add_link(id.clone(), start.clone(), end.clone());
        }
        network.labels.register(asset.asset_type(), asset.label());
        network.assets.insert(id, asset.clone());
    }

    // Phase 3: customer point deletes, then puts.
    for id in &moment.delete_customer_points {
        let Some(old) = network.customer_points.remove(id) else {
            continue;
        };
        network.lookup.remove(&old);
        reverse.put_customer_points.push(old);
    }
    let mut reversed_points: FxHashSet<CustomerPointId> = FxHashSet::default();
    for point in &moment.put_customer_points {
        let first = reversed_points.insert(point.id.clone());
        if let Some(old) = network.customer_points.get(&point.id).cloned() {
            network.lookup.remove(&old);
            if first {
                reverse.put_customer_points.push(old);
            }
        } else if first {
            reverse.delete_customer_points.push(point.id.clone());
        }
        network.lookup.insert(point);
        network.customer_points.insert(point.id.clone(), point.clone());
    }

    // Phase 4: coarse process-level puts.
    if let Some(curves) = &moment.put_curves {
        reverse.put_curves = Some(std::mem::replace(&mut network.curves, curves.clone()));
    }
    if let Some(demands) = moment.put_demands {
        reverse.put_demands = Some(std::mem::replace(&mut network.demand_scaling, demands));
    }
    if let Some(timing) = moment.put_eps_timing {
        reverse.put_eps_timing = Some(std::mem::replace(&mut network.eps_timing, timing));
    }
    if let Some(controls) = &moment.put_controls {
        reverse.put_controls = Some(std::mem::replace(&mut network.controls, controls.clone()));
    }

    reverse
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use aqueduct_geom::{LineString, Point};

    use super::*;
    use crate::asset::{Asset, Junction, Pipe};
    use crate::customer::{CustomerConnection, CustomerPoint};
    use crate::ident::{AssetId, CustomerPointId};
    use crate::moment::{DemandScaling, EpsTiming};

    fn junction(id: &str, label: &str, x: f64, y: f64) -> Asset {
        Asset::Junction(Junction {
            id: AssetId::from(id),
            label: label.to_owned(),
            position: Point::new(x, y),
            elevation: 0.0,
            base_demand: 0.0,
        })
    }

    fn pipe(id: &str, label: &str, start: &str, end: &str) -> Asset {
        Asset::Pipe(Pipe::new(
            AssetId::from(id),
            label,
            LineString::straight(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            (AssetId::from(start), AssetId::from(end)),
            150.0,
            100.0,
        ))
    }

    fn seeded_network() -> Network {
        let mut network = Network::new();
        let seed = Moment::new("seed")
            .with_put_asset(junction("j1", "J1", 0.0, 0.0))
            .with_put_asset(junction("j2", "J2", 10.0, 0.0))
            .with_put_asset(pipe("p1", "P1", "j1", "j2"));
        apply_moment(&mut network, &seed);
        network
    }

    #[test]
    fn put_wires_topology_and_labels() {
        let network = seeded_network();
        assert_eq!(network.asset_count(), 3);
        assert!(network.topology().has_link(&AssetId::from("p1")));
        assert_eq!(network.links_at(&AssetId::from("j1")).count(), 1);
        assert_eq!(network.labels().count("P1"), 1);
    }

    #[test]
    fn delete_put_roundtrip_restores_prestate() {
        let mut network = seeded_network();
        let before: Vec<Asset> = {
            let mut assets: Vec<Asset> = network.nodes().chain(network.links()).cloned().collect();
            assets.sort_by(|a, b| a.id().cmp(b.id()));
            assets
        };

        let moment = Moment::new("delete pipe").with_delete_assets([AssetId::from("p1")]);
        let reverse = apply_moment(&mut network, &moment);
        assert!(!network.topology().has_link(&AssetId::from("p1")));
        assert_eq!(network.labels().count("P1"), 0);

        apply_moment(&mut network, &reverse);
        assert!(network.topology().has_link(&AssetId::from("p1")));
        assert_eq!(network.labels().count("P1"), 1);
        let after: Vec<Asset> = {
            let mut assets: Vec<Asset> = network.nodes().chain(network.links()).cloned().collect();
            assets.sort_by(|a, b| a.id().cmp(b.id()));
            assets
        };
        assert_eq!(after, before);
    }

    #[test]
    fn replacing_a_link_removes_stale_edges_first() {
        let mut network = seeded_network();
        let extra = Moment::new("add j3").with_put_asset(junction("j3", "J3", 20.0, 0.0));
        apply_moment(&mut network, &extra);

        // Rewire p1 from j1-j2 to j1-j3.
        let rewired = pipe("p1", "P1", "j1", "j3");
        let moment = Moment::new("rewire").with_put_asset(rewired);
        let reverse = apply_moment(&mut network, &moment);

        assert_eq!(network.links_at(&AssetId::from("j2")).count(), 0);
        assert_eq!(network.links_at(&AssetId::from("j3")).count(), 1);
        // Same label carried over: exactly one holder, not two.
        assert_eq!(network.labels().count("P1"), 1);

        apply_moment(&mut network, &reverse);
        assert_eq!(network.links_at(&AssetId::from("j2")).count(), 1);
        assert_eq!(network.links_at(&AssetId::from("j3")).count(), 0);
    }

    #[test]
    fn new_put_reverses_to_delete() {
        let mut network = seeded_network();
        let moment = Moment::new("add j9").with_put_asset(junction("j9", "J9", 1.0, 1.0));
        let reverse = apply_moment(&mut network, &moment);
        assert_eq!(reverse.delete_assets, vec![AssetId::from("j9")]);
        assert!(reverse.put_assets.is_empty());

        apply_moment(&mut network, &reverse);
        assert!(!network.contains(&AssetId::from("j9")));
    }

    #[test]
    fn duplicate_id_puts_reverse_to_the_prestate() {
        let mut network = seeded_network();
        let before: Vec<Asset> = {
            let mut assets: Vec<Asset> = network.nodes().chain(network.links()).cloned().collect();
            assets.sort_by(|a, b| a.id().cmp(b.id()));
            assets
        };

        // Two puts of j1 in one batch: the reverse must restore the
        // pre-state, not the intermediate x=5 version.
        let moment = Moment::new("drag j1")
            .with_put_asset(junction("j1", "J1", 5.0, 0.0))
            .with_put_asset(junction("j1", "J1", 9.0, 0.0));
        let reverse = apply_moment(&mut network, &moment);
        assert_eq!(reverse.put_assets.len(), 1);
        assert_eq!(
            network.asset(&AssetId::from("j1")).and_then(Asset::position),
            Some(Point::new(9.0, 0.0))
        );
        assert_eq!(network.labels().count("J1"), 1);

        apply_moment(&mut network, &reverse);
        let after: Vec<Asset> = {
            let mut assets: Vec<Asset> = network.nodes().chain(network.links()).cloned().collect();
            assets.sort_by(|a, b| a.id().cmp(b.id()));
            assets
        };
        assert_eq!(after, before);
        assert_eq!(network.labels().count("J1"), 1);
    }

    #[test]
    fn duplicate_new_id_puts_reverse_to_a_single_delete() {
        let mut network = seeded_network();
        let moment = Moment::new("add j9 twice")
            .with_put_asset(junction("j9", "J9", 1.0, 1.0))
            .with_put_asset(junction("j9", "J9", 2.0, 2.0));
        let reverse = apply_moment(&mut network, &moment);
        assert_eq!(reverse.delete_assets, vec![AssetId::from("j9")]);
        assert!(reverse.put_assets.is_empty());

        apply_moment(&mut network, &reverse);
        assert!(!network.contains(&AssetId::from("j9")));
        assert_eq!(network.labels().count("J9"), 0);
    }

    #[test]
    fn duplicate_customer_point_puts_reverse_once() {
        let mut network = seeded_network();
        let point = CustomerPoint::new(CustomerPointId::from("c1"), Point::new(5.0, 3.0), vec![]);
        apply_moment(
            &mut network,
            &Moment::new("seed point").with_put_customer_point(point.clone()),
        );

        let connected = point.connect(CustomerConnection {
            pipe_id: AssetId::from("p1"),
            junction_id: AssetId::from("j1"),
            snap_point: Point::new(5.0, 0.0),
            distance: 3.0,
        });
        let moment = Moment::new("connect twice")
            .with_put_customer_point(connected.clone())
            .with_put_customer_point(connected);
        let reverse = apply_moment(&mut network, &moment);
        assert_eq!(reverse.put_customer_points.len(), 1);

        apply_moment(&mut network, &reverse);
        let restored = match network.customer_point(&CustomerPointId::from("c1")) {
            Some(p) => p,
            None => panic!("point survives the round trip"),
        };
        assert!(restored.connection.is_none());
        assert_eq!(
            network
                .customer_points_for_pipe(&AssetId::from("p1"))
                .count(),
            0
        );
    }

    #[test]
    fn customer_point_swap_maintains_lookup() {
        let mut network = seeded_network();
        let point = CustomerPoint::new(
            CustomerPointId::from("c1"),
            Point::new(5.0, 3.0),
            vec![],
        );
        let connected = point.connect(CustomerConnection {
            pipe_id: AssetId::from("p1"),
            junction_id: AssetId::from("j1"),
            snap_point: Point::new(5.0, 0.0),
            distance: 3.0,
        });
        let moment = Moment::new("connect").with_put_customer_point(connected);
        let reverse = apply_moment(&mut network, &moment);
        assert_eq!(
            network
                .customer_points_for_pipe(&AssetId::from("p1"))
                .count(),
            1
        );

        apply_moment(&mut network, &reverse);
        assert_eq!(
            network
                .customer_points_for_pipe(&AssetId::from("p1"))
                .count(),
            0
        );
        assert_eq!(network.customer_point_count(), 0);
    }

    #[test]
    fn coarse_puts_capture_prior_values() {
        let mut network = Network::new();
        let timing = EpsTiming {
            duration_s: 86_400,
            hydraulic_timestep_s: 3_600,
            pattern_timestep_s: 3_600,
            report_timestep_s: 7_200,
        };
        let moment = Moment::new("configure run")
            .with_demands(DemandScaling { multiplier: 2.0 })
            .with_eps_timing(timing)
            .with_controls("LINK P1 CLOSED IF NODE T1 ABOVE 20");
        let reverse = apply_moment(&mut network, &moment);
        assert!((network.demand_scaling().multiplier - 2.0).abs() < 1e-12);
        assert_eq!(network.eps_timing(), timing);
        assert_eq!(network.controls(), "LINK P1 CLOSED IF NODE T1 ABOVE 20");
        assert_eq!(reverse.put_demands, Some(DemandScaling::default()));
        assert_eq!(reverse.put_eps_timing, Some(EpsTiming::default()));
        assert_eq!(reverse.put_controls, Some(String::new()));

        apply_moment(&mut network, &reverse);
        assert!((network.demand_scaling().multiplier - 1.0).abs() < 1e-12);
        assert_eq!(network.eps_timing(), EpsTiming::default());
        assert_eq!(network.controls(), "");
    }

    #[test]
    fn deleting_absent_ids_is_a_noop() {
        let mut network = seeded_network();
        let moment = Moment::new("delete ghost").with_delete_assets([AssetId::from("nope")]);
        let reverse = apply_moment(&mut network, &moment);
        assert!(reverse.put_assets.is_empty());
        assert!(reverse.delete_assets.is_empty());
        assert_eq!(network.asset_count(), 3);
    }
}
