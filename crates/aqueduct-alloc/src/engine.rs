// SPDX-License-Identifier: Apache-2.0
//! Customer point allocation.
//!
//! Rules are evaluated in order and the first rule that yields a pipe
//! within its distance and diameter limits wins, even when a later rule
//! would admit a closer pipe. Within one rule the search expands in
//! distance buckets so dense pipe clusters are examined before the full
//! radius is swept.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use aqueduct_geom::Point;
use aqueduct_model::{CustomerConnection, CustomerPoint, CustomerPointId, Moment, Network};
use rustc_hash::FxHashSet;

use crate::index::SegmentIndex;
use crate::rules::{AllocationRule, RuleHistogram};
use crate::source::{AllocationSource, NetworkSource, NodeKind};

/// Smallest radius increment the search will take; zero, negative, or
/// non-finite bucket sizes clamp up to this so the expansion always
/// terminates.
const MIN_BUCKET_SIZE: f64 = 1e-3;

/// Tuning knobs for the bucketed radius search.
#[derive(Debug, Clone, Copy)]
pub struct AllocationConfig {
    /// Radius increment per search round, meters. Values at or below
    /// zero are clamped to a millimeter.
    pub bucket_size: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self { bucket_size: 30.0 }
    }
}

/// Result of one allocation run.
///
/// `connected` holds freshly connected copies keyed by point id; the
/// input points are untouched. Points with no eligible pipe under any
/// rule are absent from the map.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    /// Connected copies of the points that matched a rule.
    pub connected: BTreeMap<CustomerPointId, CustomerPoint>,
    /// Match counts per rule index.
    pub histogram: RuleHistogram,
}

impl AllocationOutcome {
    /// Expresses the outcome as a customer-point batch ready for
    /// [`apply_moment`](aqueduct_model::apply_moment).
    #[must_use]
    pub fn into_moment(self, note: impl Into<String>) -> Moment {
        self.connected
            .into_values()
            .fold(Moment::new(note), Moment::with_put_customer_point)
    }
}

/// A pipe segment match found during rule evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentMatch {
    pub pipe: u32,
    pub snap: Point,
    pub distance: f64,
    pub rule: usize,
}

/// Finds the first rule, in order, with a pipe segment within its
/// distance and diameter limits. Returns the closest such segment for
/// that rule, ties broken toward the lower segment slot.
pub(crate) fn match_point<S: AllocationSource>(
    source: &S,
    index: &SegmentIndex,
    rules: &[AllocationRule],
    config: AllocationConfig,
    position: Point,
) -> Option<SegmentMatch> {
    // NaN.max(x) is x, so a non-finite bucket size also lands on the floor.
    let bucket_size = config.bucket_size.max(MIN_BUCKET_SIZE);
    for (rule_index, rule) in rules.iter().enumerate() {
        let mut seen: FxHashSet<u32> = FxHashSet::default();
        let mut closest: Option<(f64, u32, Point)> = None;
        let mut radius = bucket_size.min(rule.max_distance);
        loop {
            for (slot, segment) in index.candidates_within(position, radius) {
                if !seen.insert(slot) {
                    continue;
                }
                let pipe = source.segment_pipe(slot);
                if source.pipe_diameter(pipe) > rule.max_diameter {
                    continue;
                }
                let snap = segment.nearest_point(position);
                let distance = position.distance_to(snap);
                if distance > rule.max_distance {
                    continue;
                }
                let replace = match closest {
                    None => true,
                    Some((best, best_slot, _)) => match distance.partial_cmp(&best) {
                        Some(Ordering::Less) => true,
                        Some(Ordering::Equal) => slot < best_slot,
                        _ => false,
                    },
                };
                if replace {
                    closest = Some((distance, slot, snap));
                }
            }
            // A match inside the current ring cannot be beaten by a
            // farther ring.
            if let Some((distance, _, _)) = closest {
                if distance <= radius {
                    break;
                }
            }
            if radius >= rule.max_distance {
                break;
            }
            radius = (radius + bucket_size).min(rule.max_distance);
        }
        if let Some((distance, slot, snap)) = closest {
            return Some(SegmentMatch {
                pipe: source.segment_pipe(slot),
                snap,
                distance,
                rule: rule_index,
            });
        }
    }
    None
}

/// Picks the junction endpoint for a matched pipe. Reservoir and tank
/// endpoints are ineligible; with two junctions the one nearer the snap
/// point wins.
pub(crate) fn assign_junction<S: AllocationSource>(source: &S, found: &SegmentMatch) -> Option<u32> {
    let (start, end) = source.pipe_endpoints(found.pipe);
    let start_ok = source.node_kind(start) == NodeKind::Junction;
    let end_ok = source.node_kind(end) == NodeKind::Junction;
    match (start_ok, end_ok) {
        (false, false) => None,
        (true, false) => Some(start),
        (false, true) => Some(end),
        (true, true) => {
            let to_start = source.node_position(start).distance_to(found.snap);
            let to_end = source.node_position(end).distance_to(found.snap);
            if to_end < to_start {
                Some(end)
            } else {
                Some(start)
            }
        }
    }
}

/// Allocates each point in `points` against `source`, producing
/// connected copies and the per-rule histogram. Shared by the direct
/// and parallel paths so they match result for result.
pub(crate) fn allocate_points<'a, S: AllocationSource>(
    source: &S,
    index: &SegmentIndex,
    rules: &[AllocationRule],
    config: AllocationConfig,
    points: impl IntoIterator<Item = &'a CustomerPoint>,
) -> AllocationOutcome {
    let mut connected = BTreeMap::new();
    let mut histogram = RuleHistogram::new(rules.len());
    for point in points {
        let Some(found) = match_point(source, index, rules, config, point.position) else {
            continue;
        };
        let Some(junction) = assign_junction(source, &found) else {
            continue;
        };
        histogram.record(found.rule);
        let copy = point.connect(CustomerConnection {
            pipe_id: source.pipe_id(found.pipe).clone(),
            junction_id: source.node_id(junction).clone(),
            snap_point: found.snap,
            distance: found.distance,
        });
        connected.insert(copy.id.clone(), copy);
    }
    AllocationOutcome {
        connected,
        histogram,
    }
}

/// Allocates every customer point of `network` on the calling thread.
#[must_use]
pub fn allocate(
    network: &Network,
    rules: &[AllocationRule],
    config: AllocationConfig,
) -> AllocationOutcome {
    #[cfg(feature = "telemetry")]
    let started = std::time::Instant::now();
    let source = NetworkSource::from_network(network);
    let index = SegmentIndex::build(&source);
    let outcome = allocate_points(&source, &index, rules, config, network.customer_points());
    #[cfg(feature = "telemetry")]
    crate::telemetry::allocation_complete(
        network.customer_point_count(),
        outcome.connected.len(),
        started.elapsed().as_micros(),
    );
    outcome
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::float_cmp)]

    use aqueduct_geom::Point;
    use aqueduct_model::{apply_moment, ops, AssetId, CustomerDemand, CustomerPointId, Network};

    use super::*;

    fn junction(network: &mut Network, id: &str, x: f64, y: f64) {
        let moment = ops::add_junction(network, AssetId::from(id), Point::new(x, y), 0.0, 0.0)
            .unwrap_or_else(|e| panic!("junction: {e}"));
        apply_moment(network, &moment);
    }

    fn pipe(network: &mut Network, id: &str, start: &str, end: &str, diameter: f64) {
        let moment = ops::add_pipe(
            network,
            AssetId::from(id),
            AssetId::from(start),
            AssetId::from(end),
            None,
            diameter,
            100.0,
        )
        .unwrap_or_else(|e| panic!("pipe: {e}"));
        apply_moment(network, &moment);
    }

    fn point(network: &mut Network, id: &str, x: f64, y: f64) {
        let point = CustomerPoint::new(
            CustomerPointId::from(id),
            Point::new(x, y),
            vec![CustomerDemand {
                base_demand: 1.0,
                pattern_id: None,
            }],
        );
        let moment = Moment::new("add customer point").with_put_customer_point(point);
        apply_moment(network, &moment);
    }

    #[test]
    fn first_rule_wins_over_a_closer_pipe_admitted_later() {
        let mut network = Network::default();
        junction(&mut network, "j1", 0.0, 0.0);
        junction(&mut network, "j2", 100.0, 0.0);
        junction(&mut network, "j3", 0.0, 60.0);
        junction(&mut network, "j4", 100.0, 60.0);
        // Narrow pipe 40 m away, wide pipe 20 m away.
        pipe(&mut network, "narrow", "j1", "j2", 6.0);
        pipe(&mut network, "wide", "j3", "j4", 20.0);
        point(&mut network, "c1", 50.0, 40.0);

        let rules = [
            AllocationRule {
                max_distance: 50.0,
                max_diameter: 6.0,
            },
            AllocationRule {
                max_distance: 150.0,
                max_diameter: 12.0,
            },
            AllocationRule {
                max_distance: 300.0,
                max_diameter: 24.0,
            },
        ];
        let outcome = allocate(&network, &rules, AllocationConfig::default());
        let connected = &outcome.connected[&CustomerPointId::from("c1")];
        let connection = connected.connection.as_ref().unwrap_or_else(|| panic!("connected"));
        assert_eq!(connection.pipe_id.as_str(), "narrow");
        assert_eq!(connection.distance, 40.0);
        assert_eq!(outcome.histogram.counts(), &[1, 0, 0]);
    }

    #[test]
    fn two_junction_tie_break_picks_the_nearer_endpoint() {
        let mut network = Network::default();
        junction(&mut network, "j1", 0.0, 0.0);
        junction(&mut network, "j2", 10.0, 0.0);
        pipe(&mut network, "p1", "j1", "j2", 150.0);
        // Snap point lands at x=3: 3 m from j1, 7 m from j2.
        point(&mut network, "c1", 3.0, 5.0);

        let rules = [AllocationRule {
            max_distance: 50.0,
            max_diameter: 300.0,
        }];
        let outcome = allocate(&network, &rules, AllocationConfig::default());
        let connection = outcome.connected[&CustomerPointId::from("c1")]
            .connection
            .as_ref()
            .unwrap_or_else(|| panic!("connected"));
        assert_eq!(connection.junction_id.as_str(), "j1");
        assert_eq!(connection.snap_point, Point::new(3.0, 0.0));
    }

    #[test]
    fn points_beyond_every_rule_stay_disconnected() {
        let mut network = Network::default();
        junction(&mut network, "j1", 0.0, 0.0);
        junction(&mut network, "j2", 10.0, 0.0);
        pipe(&mut network, "p1", "j1", "j2", 150.0);
        point(&mut network, "c1", 5.0, 500.0);

        let rules = [AllocationRule {
            max_distance: 100.0,
            max_diameter: 300.0,
        }];
        let outcome = allocate(&network, &rules, AllocationConfig::default());
        assert!(outcome.connected.is_empty());
        assert_eq!(outcome.histogram.total(), 0);
    }

    #[test]
    fn degenerate_bucket_size_still_terminates() {
        let mut network = Network::default();
        junction(&mut network, "j1", 0.0, 0.0);
        junction(&mut network, "j2", 10.0, 0.0);
        pipe(&mut network, "p1", "j1", "j2", 150.0);
        // No candidate inside the first bucket, so the expansion must
        // advance even with a clamped step.
        point(&mut network, "c1", 5.0, 40.0);

        let rules = [AllocationRule {
            max_distance: 50.0,
            max_diameter: 300.0,
        }];
        for bucket_size in [0.0, -3.0, f64::NAN] {
            let outcome = allocate(&network, &rules, AllocationConfig { bucket_size });
            let connection = outcome.connected[&CustomerPointId::from("c1")]
                .connection
                .as_ref()
                .unwrap_or_else(|| panic!("connected"));
            assert_eq!(connection.pipe_id.as_str(), "p1");
            assert_eq!(connection.distance, 40.0);
        }
    }

    #[test]
    fn empty_network_allocates_nothing() {
        let mut network = Network::default();
        point(&mut network, "c1", 0.0, 0.0);
        let rules = [AllocationRule {
            max_distance: 100.0,
            max_diameter: 300.0,
        }];
        let outcome = allocate(&network, &rules, AllocationConfig::default());
        assert!(outcome.connected.is_empty());
    }

    #[test]
    fn into_moment_carries_every_connected_copy() {
        let mut network = Network::default();
        junction(&mut network, "j1", 0.0, 0.0);
        junction(&mut network, "j2", 10.0, 0.0);
        pipe(&mut network, "p1", "j1", "j2", 150.0);
        point(&mut network, "c1", 3.0, 5.0);
        point(&mut network, "c2", 7.0, 2.0);

        let rules = [AllocationRule {
            max_distance: 50.0,
            max_diameter: 300.0,
        }];
        let outcome = allocate(&network, &rules, AllocationConfig::default());
        let moment = outcome.into_moment("allocate customers");
        assert_eq!(moment.put_customer_points.len(), 2);

        let reverse = apply_moment(&mut network, &moment);
        let stored = network
            .customer_point(&CustomerPointId::from("c1"))
            .unwrap_or_else(|| panic!("point"));
        assert!(stored.connection.is_some());
        apply_moment(&mut network, &reverse);
        let restored = network
            .customer_point(&CustomerPointId::from("c1"))
            .unwrap_or_else(|| panic!("point"));
        assert!(restored.connection.is_none());
    }
}
