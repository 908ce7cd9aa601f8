// SPDX-License-Identifier: Apache-2.0
//! Pump performance curve fitting.
//!
//! Pumps are described either by a single design point or by an explicit
//! three-point head/flow curve. This crate fits the standard power curve
//! `h(q) = a - b*q^c` through three points, synthesizes a three-point curve
//! from a lone design point, and samples fitted curves for plotting.
//!
//! Every failure mode is an expected empty result: the fit returns `None`
//! for curves the power form cannot represent, never an error. Callers must
//! treat `None` as "curve not representable".
#![forbid(unsafe_code)]

/// A single head/flow sample on a pump curve.
///
/// `flow` and `head` carry the model's working units (flow in the model's
/// flow unit, head in meters).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    /// Flow rate at this sample.
    pub flow: f64,
    /// Head at this sample.
    pub head: f64,
}

impl CurvePoint {
    /// Creates a curve point.
    #[must_use]
    pub fn new(flow: f64, head: f64) -> Self {
        Self { flow, head }
    }
}

/// How a pump's performance curve is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PumpDefinition {
    /// A single design point; the full curve is synthesized around it.
    DesignPoint(CurvePoint),
    /// An explicit three-point curve (shutoff, design, max flow), in
    /// increasing-flow order.
    ThreePoint([CurvePoint; 3]),
}

/// Coefficients of the fitted power curve `h(q) = a - b*q^c`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerCurve {
    /// Shutoff head: the head at zero flow.
    pub a: f64,
    /// Head drop coefficient (positive).
    pub b: f64,
    /// Flow exponent, in `(0, 20]`.
    pub c: f64,
}

impl PowerCurve {
    /// Evaluates the curve head at `flow`.
    #[must_use]
    pub fn head_at(&self, flow: f64) -> f64 {
        self.a - self.b * flow.powf(self.c)
    }

    /// The flow at which the fitted head reaches zero.
    #[must_use]
    pub fn max_flow(&self) -> f64 {
        (self.a / self.b).powf(1.0 / self.c)
    }
}

/// Shutoff head multiplier used when synthesizing a curve from one design
/// point (the standard single-point heuristic).
const SHUTOFF_HEAD_FACTOR: f64 = 1.33334;
/// Max-flow multiplier used when synthesizing a curve from one design point.
const MAX_FLOW_FACTOR: f64 = 2.0;
/// Upper bound of iterations for the fixed-point fit.
const MAX_ITERATIONS: usize = 5;
/// Convergence tolerance on the shutoff head estimate.
const CONVERGENCE_TOLERANCE: f64 = 0.01;
/// Number of samples produced by [`smooth_curve_points`].
const SMOOTH_SAMPLE_COUNT: usize = 25;

/// Fits `h(q) = a - b*q^c` through three curve points.
///
/// The points must be in strictly increasing flow order with strictly
/// decreasing heads. The shutoff head `a` is solved by fixed-point
/// iteration: each pass fits `c` and `b` from the two higher-flow points
/// against the current `a`, then re-estimates `a` from the lowest-flow
/// point. When the lowest-flow point sits at zero flow (the synthesized
/// case) the iteration converges immediately.
///
/// Returns `None` when the points violate the preconditions or when the
/// iteration diverges (`b <= 0`, `c` outside `(0, 20]`, or no convergence
/// within the iteration budget).
#[must_use]
pub fn fit_power_curve(points: &[CurvePoint]) -> Option<PowerCurve> {
    let [p0, p1, p2] = points else {
        return None;
    };
    if !(p0.flow < p1.flow && p1.flow < p2.flow) {
        return None;
    }
    if !(p0.head > p1.head && p1.head > p2.head) {
        return None;
    }
    if p0.head <= 0.0 {
        return None;
    }

    let mut a = p0.head + (p0.head - p1.head);
    if p0.flow == 0.0 {
        a = p0.head;
    }
    for _ in 0..MAX_ITERATIONS {
        let h1 = a - p1.head;
        let h2 = a - p2.head;
        if h1 <= 0.0 || h2 <= 0.0 {
            return None;
        }
        let c = (h2 / h1).ln() / (p2.flow / p1.flow).ln();
        if c <= 0.0 || c > 20.0 {
            return None;
        }
        let b = h1 / p1.flow.powf(c);
        if b <= 0.0 {
            return None;
        }
        // Re-estimate the shutoff head from the lowest-flow point.
        let next_a = p0.head + b * p0.flow.powf(c);
        if next_a <= 0.0 {
            return None;
        }
        if (next_a - a).abs() <= CONVERGENCE_TOLERANCE {
            return Some(PowerCurve { a: next_a, b, c });
        }
        a = next_a;
    }
    None
}

/// Derives a standard three-point curve from a single design point.
///
/// Shutoff head is `1.33334x` the design head at zero flow; max flow is
/// `2x` the design flow at zero head.
#[must_use]
pub fn synthesize_three_points(design: CurvePoint) -> [CurvePoint; 3] {
    [
        CurvePoint::new(0.0, SHUTOFF_HEAD_FACTOR * design.head),
        design,
        CurvePoint::new(MAX_FLOW_FACTOR * design.flow, 0.0),
    ]
}

/// Samples a fitted pump curve for plotting.
///
/// Design-point pumps yield 25 evenly spaced flows over `[0, max_flow]` of
/// the fitted curve. Explicit three-point definitions are already concrete
/// and return `None`, as does a failed fit.
#[must_use]
pub fn smooth_curve_points(definition: &PumpDefinition) -> Option<Vec<CurvePoint>> {
    let design = match definition {
        PumpDefinition::ThreePoint(_) => return None,
        PumpDefinition::DesignPoint(p) => *p,
    };
    let curve = fit_power_curve(&synthesize_three_points(design))?;
    let q_max = curve.max_flow();
    if !q_max.is_finite() || q_max <= 0.0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)] // sample count is tiny
    let step = q_max / (SMOOTH_SAMPLE_COUNT - 1) as f64;
    Some(
        (0..SMOOTH_SAMPLE_COUNT)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let q = step * i as f64;
                CurvePoint::new(q, curve.head_at(q))
            })
            .collect(),
    )
}
