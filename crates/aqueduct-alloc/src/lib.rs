// SPDX-License-Identifier: Apache-2.0
//! aqueduct-alloc: customer point allocation.
//!
//! Assigns off-network customer demand points to the nearest eligible
//! pipe and junction under ordered distance/diameter rules. Two paths
//! produce identical results: [`allocate`] walks the model directly on
//! one thread, and [`allocate_parallel`] fans out over a
//! [`PackedNetwork`] snapshot shared by worker threads.
#![forbid(unsafe_code)]

mod buffer;
mod engine;
mod index;
mod rules;
mod source;
/// JSONL telemetry events for allocation runs.
#[cfg(feature = "telemetry")]
pub mod telemetry;
mod worker;

pub use buffer::{
    segment_coordinates, segment_count, segment_pipe_index, BufferError, NodeRow, PackedNetwork,
    PackedSource, HEADER_BYTES, NODE_RECORD_BYTES, SEGMENT_RECORD_BYTES,
};
pub use engine::{allocate, AllocationConfig, AllocationOutcome};
pub use index::SegmentIndex;
pub use rules::{AllocationRule, RuleHistogram};
pub use source::{AllocationSource, NetworkSource, NodeKind};
pub use worker::allocate_parallel;
