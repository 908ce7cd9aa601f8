// SPDX-License-Identifier: Apache-2.0
//! Parallel allocation over packed buffers.
//!
//! Workers share one validated [`PackedSource`] and one segment index
//! by reference; the only mutable state in the hot loop is worker-local.
//! Chunks of the customer-point slice are claimed through an atomic
//! cursor, so an uneven point distribution cannot starve threads.

use std::sync::atomic::{AtomicUsize, Ordering};

use aqueduct_model::CustomerPoint;

use crate::buffer::{BufferError, PackedNetwork};
use crate::engine::{allocate_points, AllocationConfig, AllocationOutcome};
use crate::index::SegmentIndex;
use crate::rules::{AllocationRule, RuleHistogram};

/// Points claimed per cursor increment.
const CHUNK: usize = 256;

/// Allocates `points` against a packed network snapshot on `workers`
/// threads. Produces the same outcome as the direct path for the same
/// input.
///
/// # Errors
///
/// Returns [`BufferError`] when the packed buffers fail validation.
///
/// # Panics
///
/// Panics if `workers` is 0, or re-raises a worker thread's panic.
pub fn allocate_parallel(
    packed: &PackedNetwork,
    points: &[CustomerPoint],
    rules: &[AllocationRule],
    config: AllocationConfig,
    workers: usize,
) -> Result<AllocationOutcome, BufferError> {
    assert!(workers > 0, "workers must be > 0");

    #[cfg(feature = "telemetry")]
    let started = std::time::Instant::now();
    let source = packed.source()?;
    let index = SegmentIndex::build(&source);

    if points.is_empty() {
        return Ok(AllocationOutcome {
            connected: std::collections::BTreeMap::new(),
            histogram: RuleHistogram::new(rules.len()),
        });
    }

    let cursor = AtomicUsize::new(0);
    let partials: Vec<AllocationOutcome> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let source = &source;
                let index = &index;
                let cursor = &cursor;
                s.spawn(move || {
                    let mut outcome = AllocationOutcome {
                        connected: std::collections::BTreeMap::new(),
                        histogram: RuleHistogram::new(rules.len()),
                    };
                    loop {
                        let start = cursor.fetch_add(CHUNK, Ordering::Relaxed);
                        if start >= points.len() {
                            break;
                        }
                        let end = (start + CHUNK).min(points.len());
                        let partial =
                            allocate_points(source, index, rules, config, &points[start..end]);
                        outcome.connected.extend(partial.connected);
                        outcome.histogram.merge(&partial.histogram);
                    }
                    outcome
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(outcome) => outcome,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect()
    });

    // Workers own disjoint point chunks, so the merge is a plain union;
    // the BTreeMap keeps it ordered by point id regardless of which
    // thread got there first.
    let mut merged = AllocationOutcome {
        connected: std::collections::BTreeMap::new(),
        histogram: RuleHistogram::new(rules.len()),
    };
    for partial in partials {
        merged.connected.extend(partial.connected);
        merged.histogram.merge(&partial.histogram);
    }
    #[cfg(feature = "telemetry")]
    crate::telemetry::allocation_complete(
        points.len(),
        merged.connected.len(),
        started.elapsed().as_micros(),
    );
    Ok(merged)
}
