// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::float_cmp)]

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use aqueduct_alloc::{
    allocate, allocate_parallel, AllocationConfig, AllocationRule, PackedNetwork,
};
use aqueduct_geom::Point;
use aqueduct_model::{
    apply_moment, ops, AssetId, CustomerDemand, CustomerPoint, CustomerPointId, Moment, Network,
};

fn add_junction(network: &mut Network, id: &str, x: f64, y: f64) {
    let moment = ops::add_junction(network, AssetId::from(id), Point::new(x, y), 0.0, 0.0)
        .expect("junction");
    apply_moment(network, &moment);
}

fn add_pipe(network: &mut Network, id: &str, start: &str, end: &str, diameter: f64) {
    let moment = ops::add_pipe(
        network,
        AssetId::from(id),
        AssetId::from(start),
        AssetId::from(end),
        None,
        diameter,
        100.0,
    )
    .expect("pipe");
    apply_moment(network, &moment);
}

fn add_point(network: &mut Network, id: &str, x: f64, y: f64) {
    let point = CustomerPoint::new(
        CustomerPointId::from(id),
        Point::new(x, y),
        vec![CustomerDemand {
            base_demand: 1.0,
            pattern_id: None,
        }],
    );
    apply_moment(network, &Moment::new("seed point").with_put_customer_point(point));
}

/// A ladder of horizontal pipes with varied diameters: rung `r` runs
/// along `y = r * 100` with diameter `50 + r * 50`.
fn ladder_network(rungs: u32) -> Network {
    let mut network = Network::default();
    for rung in 0..rungs {
        let y = f64::from(rung) * 100.0;
        add_junction(&mut network, &format!("j{rung}a"), 0.0, y);
        add_junction(&mut network, &format!("j{rung}b"), 1000.0, y);
        add_pipe(
            &mut network,
            &format!("p{rung}"),
            &format!("j{rung}a"),
            &format!("j{rung}b"),
            50.0 + f64::from(rung) * 50.0,
        );
    }
    network
}

#[test]
fn rule_order_beats_proximity() {
    // A diameter-20 pipe 10 m away and a diameter-6 pipe 45 m away: the
    // first rule only admits the narrow pipe, so the far pipe wins.
    let mut network = Network::default();
    add_junction(&mut network, "j1", 0.0, 10.0);
    add_junction(&mut network, "j2", 100.0, 10.0);
    add_pipe(&mut network, "wide", "j1", "j2", 20.0);
    add_junction(&mut network, "j3", 0.0, 45.0);
    add_junction(&mut network, "j4", 100.0, 45.0);
    add_pipe(&mut network, "narrow", "j3", "j4", 6.0);
    add_point(&mut network, "c1", 50.0, 0.0);

    let rules = [
        AllocationRule::new(50.0, 6.0),
        AllocationRule::new(150.0, 12.0),
        AllocationRule::new(300.0, 24.0),
    ];
    let outcome = allocate(&network, &rules, AllocationConfig::default());
    let connection = outcome.connected[&CustomerPointId::from("c1")]
        .connection
        .as_ref()
        .expect("connected");
    assert_eq!(connection.pipe_id.as_str(), "narrow");
    assert_eq!(outcome.histogram.counts(), &[1, 0, 0]);
}

#[test]
fn proptest_seed_pinned_direct_worker_parity() {
    const SEED_BYTES: [u8; 32] = [
        0x7A, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];

    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(
        PropConfig {
            cases: 64,
            ..PropConfig::default()
        },
        rng,
    );

    let coordinate = (-200.0f64..1200.0, -100.0f64..600.0);
    let prop = (
        2u32..6,
        prop::collection::vec(coordinate, 1..120),
        1usize..6,
    );

    runner
        .run(&prop, |(rungs, coords, workers)| {
            let mut network = ladder_network(rungs);
            for (i, (x, y)) in coords.iter().enumerate() {
                add_point(&mut network, &format!("c{i:04}"), *x, *y);
            }
            let rules = [
                AllocationRule::new(60.0, 75.0),
                AllocationRule::new(150.0, 160.0),
                AllocationRule::new(400.0, 500.0),
            ];

            let direct = allocate(&network, &rules, AllocationConfig::default());
            let packed = PackedNetwork::pack(&network);
            let points: Vec<CustomerPoint> = network.customer_points().cloned().collect();
            let parallel = allocate_parallel(
                &packed,
                &points,
                &rules,
                AllocationConfig::default(),
                workers,
            )
            .expect("valid buffers");

            prop_assert_eq!(direct.histogram, parallel.histogram);
            prop_assert_eq!(direct.connected.len(), parallel.connected.len());
            for (id, point) in &direct.connected {
                let twin = parallel.connected.get(id).expect("present in both");
                let a = point.connection.as_ref().expect("connected");
                let b = twin.connection.as_ref().expect("connected");
                prop_assert_eq!(&a.pipe_id, &b.pipe_id);
                prop_assert_eq!(&a.junction_id, &b.junction_id);
                prop_assert_eq!(a.distance, b.distance);
            }
            Ok(())
        })
        .expect("parity holds");
}

#[test]
fn reservoir_endpoints_are_never_assigned() {
    let mut network = Network::default();
    add_junction(&mut network, "j1", 100.0, 0.0);
    let reservoir = ops::add_reservoir(&network, AssetId::from("r1"), Point::new(0.0, 0.0), 50.0)
        .expect("reservoir");
    apply_moment(&mut network, &reservoir);
    add_pipe(&mut network, "p1", "r1", "j1", 200.0);
    // Nearest endpoint is the reservoir; assignment must fall to j1.
    add_point(&mut network, "c1", 10.0, 8.0);

    let rules = [AllocationRule::new(50.0, 300.0)];
    let outcome = allocate(&network, &rules, AllocationConfig::default());
    let connection = outcome.connected[&CustomerPointId::from("c1")]
        .connection
        .as_ref()
        .expect("connected");
    assert_eq!(connection.junction_id.as_str(), "j1");
}

#[test]
fn allocation_moment_round_trips_through_the_engine() {
    let mut network = ladder_network(2);
    add_point(&mut network, "c1", 500.0, 20.0);
    add_point(&mut network, "c2", 500.0, 130.0);

    let rules = [AllocationRule::new(60.0, 500.0)];
    let outcome = allocate(&network, &rules, AllocationConfig::default());
    assert_eq!(outcome.connected.len(), 2);

    let moment = outcome.into_moment("allocate demand");
    let reverse = apply_moment(&mut network, &moment);
    assert!(network
        .customer_points()
        .all(|p| p.connection.is_some()));

    apply_moment(&mut network, &reverse);
    assert!(network
        .customer_points()
        .all(|p| p.connection.is_none()));
}
