// SPDX-License-Identifier: Apache-2.0
//! Read-only access to hydraulic simulation results.
//!
//! The model never computes hydraulics. A solver (or a recording of one)
//! implements [`ResultsReader`]; the model and its consumers read through
//! it. Every accessor returns `None` for ids the result set does not
//! cover — absent results are expected, not errors.

use crate::ident::AssetId;

/// Reported operating state of a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PumpStatus {
    /// Running.
    On,
    /// Stopped.
    Off,
}

/// Reported operating state of a valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValveStatus {
    /// Fully open.
    Open,
    /// Actively controlling.
    Active,
    /// Closed.
    Closed,
}

/// Read-only view of one simulation's results.
pub trait ResultsReader {
    /// Pressure at a node, when available.
    fn pressure(&self, id: &AssetId) -> Option<f64>;
    /// Flow through a link, when available.
    fn flow(&self, id: &AssetId) -> Option<f64>;
    /// Velocity in a link, when available.
    fn velocity(&self, id: &AssetId) -> Option<f64>;
    /// Head loss across a link, when available.
    fn headloss(&self, id: &AssetId) -> Option<f64>;
    /// Pump operating status, when available.
    fn pump_status(&self, id: &AssetId) -> Option<PumpStatus>;
    /// Valve operating status, when available.
    fn valve_status(&self, id: &AssetId) -> Option<ValveStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    /// Minimal in-memory reader, as a consumer would record one.
    #[derive(Default)]
    struct RecordedResults {
        pressures: FxHashMap<AssetId, f64>,
        flows: FxHashMap<AssetId, f64>,
    }

    impl ResultsReader for RecordedResults {
        fn pressure(&self, id: &AssetId) -> Option<f64> {
            self.pressures.get(id).copied()
        }
        fn flow(&self, id: &AssetId) -> Option<f64> {
            self.flows.get(id).copied()
        }
        fn velocity(&self, _id: &AssetId) -> Option<f64> {
            None
        }
        fn headloss(&self, _id: &AssetId) -> Option<f64> {
            None
        }
        fn pump_status(&self, _id: &AssetId) -> Option<PumpStatus> {
            None
        }
        fn valve_status(&self, _id: &AssetId) -> Option<ValveStatus> {
            None
        }
    }

    #[test]
    fn absent_results_are_none_not_errors() {
        let mut results = RecordedResults::default();
        results.pressures.insert(AssetId::from("j1"), 42.5);
        results.flows.insert(AssetId::from("p1"), 1.25);

        assert_eq!(results.pressure(&AssetId::from("j1")), Some(42.5));
        assert_eq!(results.pressure(&AssetId::from("j2")), None);
        assert_eq!(results.flow(&AssetId::from("p1")), Some(1.25));
        assert_eq!(results.velocity(&AssetId::from("p1")), None);
    }
}
