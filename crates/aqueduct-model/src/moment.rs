// SPDX-License-Identifier: Apache-2.0
//! Moments: declarative, reversible mutation batches.
//!
//! A moment says *what to change*, not how: asset puts and deletes,
//! customer point puts and deletes, and coarse whole-value replacements of
//! process-level state (curves, demand scaling, EPS timing, controls).
//! Applying a moment yields its exact inverse — see
//! [`apply_moment`](crate::engine::apply_moment).

use aqueduct_curve::CurvePoint;

use crate::asset::Asset;
use crate::customer::CustomerPoint;
use crate::ident::{AssetId, CustomerPointId};

/// A named curve (pump, volume, or head curve) owned by the model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Curve {
    /// Curve identifier.
    pub id: String,
    /// Samples in increasing flow order.
    pub points: Vec<CurvePoint>,
}

/// Global demand scaling applied to all base demands.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DemandScaling {
    /// Multiplier applied to every base demand.
    pub multiplier: f64,
}

impl Default for DemandScaling {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

/// Extended-period simulation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpsTiming {
    /// Total simulation duration, seconds. Zero means single-period.
    pub duration_s: u64,
    /// Hydraulic timestep, seconds.
    pub hydraulic_timestep_s: u64,
    /// Demand pattern timestep, seconds.
    pub pattern_timestep_s: u64,
    /// Reporting timestep, seconds.
    pub report_timestep_s: u64,
}

/// A declarative batch of model changes, applied atomically and reversibly.
///
/// Every field defaults to "no change". The reverse moment produced by the
/// engine is structurally identical: puts capture prior values, deletes
/// capture deleted values as puts, and coarse fields capture the prior
/// whole value.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Moment {
    /// Human-readable description (undo menu entry).
    pub note: String,
    /// Assets to insert or replace.
    pub put_assets: Vec<Asset>,
    /// Asset ids to delete. Deleting an absent id is a no-op.
    pub delete_assets: Vec<AssetId>,
    /// Customer points to insert or replace.
    pub put_customer_points: Vec<CustomerPoint>,
    /// Customer point ids to delete. Deleting an absent id is a no-op.
    pub delete_customer_points: Vec<CustomerPointId>,
    /// Whole-value replacement of the curve set, when present.
    pub put_curves: Option<Vec<Curve>>,
    /// Whole-value replacement of demand scaling, when present.
    pub put_demands: Option<DemandScaling>,
    /// Whole-value replacement of EPS timing, when present.
    pub put_eps_timing: Option<EpsTiming>,
    /// Whole-value replacement of the controls text, when present.
    pub put_controls: Option<String>,
}

impl Moment {
    /// Creates an empty moment with a note.
    #[must_use]
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            note: note.into(),
            ..Self::default()
        }
    }

    /// Adds an asset put.
    #[must_use]
    pub fn with_put_asset(mut self, asset: Asset) -> Self {
        self.put_assets.push(asset);
        self
    }

    /// Adds asset deletions.
    #[must_use]
    pub fn with_delete_assets(mut self, ids: impl IntoIterator<Item = AssetId>) -> Self {
        self.delete_assets.extend(ids);
        self
    }

    /// Adds a customer point put.
    #[must_use]
    pub fn with_put_customer_point(mut self, point: CustomerPoint) -> Self {
        self.put_customer_points.push(point);
        self
    }

    /// Sets the curve set replacement.
    #[must_use]
    pub fn with_curves(mut self, curves: Vec<Curve>) -> Self {
        self.put_curves = Some(curves);
        self
    }

    /// Sets the demand scaling replacement.
    #[must_use]
    pub fn with_demands(mut self, demands: DemandScaling) -> Self {
        self.put_demands = Some(demands);
        self
    }

    /// Sets the EPS timing replacement.
    #[must_use]
    pub fn with_eps_timing(mut self, timing: EpsTiming) -> Self {
        self.put_eps_timing = Some(timing);
        self
    }

    /// Sets the controls text replacement.
    #[must_use]
    pub fn with_controls(mut self, controls: impl Into<String>) -> Self {
        self.put_controls = Some(controls.into());
        self
    }

    /// Whether the moment changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.put_assets.is_empty()
            && self.delete_assets.is_empty()
            && self.put_customer_points.is_empty()
            && self.delete_customer_points.is_empty()
            && self.put_curves.is_none()
            && self.put_demands.is_none()
            && self.put_eps_timing.is_none()
            && self.put_controls.is_none()
    }
}
