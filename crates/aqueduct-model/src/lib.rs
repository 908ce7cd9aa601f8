// SPDX-License-Identifier: Apache-2.0
//! aqueduct-model: the hydraulic network domain model.
//!
//! An in-memory water distribution network — nodes, links, customer demand
//! points — with a reversible mutation engine underneath undo/redo. All
//! change flows through [`Moment`] batches: producers in [`ops`] validate
//! intent and build moments; [`apply_moment`] applies them atomically and
//! returns the exact inverse batch.
#![forbid(unsafe_code)]

mod asset;
mod customer;
mod engine;
mod ident;
mod label;
mod moment;
mod network;
/// Validated moment producers (the input-validation boundary).
pub mod ops;
mod results;
mod topology;

pub use asset::{Asset, AssetType, Junction, Pipe, Pump, Reservoir, Tank, Valve, ValveKind};
pub use customer::{CustomerConnection, CustomerDemand, CustomerPoint, CustomerPointsLookup};
pub use engine::apply_moment;
pub use ident::{AssetId, CustomerPointId, IdGenerator};
pub use label::LabelManager;
pub use moment::{Curve, DemandScaling, EpsTiming, Moment};
pub use network::Network;
pub use ops::MomentError;
pub use results::{PumpStatus, ResultsReader, ValveStatus};
pub use topology::{AssetIndex, Topology};
