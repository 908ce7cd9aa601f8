// SPDX-License-Identifier: Apache-2.0
//! Allocation rules and match bookkeeping.

/// One gate in the ordered allocation rule list.
///
/// A pipe segment is eligible under a rule when its pipe's diameter is at
/// most `max_diameter` and its distance to the customer point is at most
/// `max_distance`. Rules are evaluated in order; the first rule that yields
/// any eligible pipe wins, even if a later rule would find a closer one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationRule {
    /// Maximum snap distance, meters.
    pub max_distance: f64,
    /// Maximum eligible pipe diameter, millimeters.
    pub max_diameter: f64,
}

impl AllocationRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(max_distance: f64, max_diameter: f64) -> Self {
        Self {
            max_distance,
            max_diameter,
        }
    }
}

/// Per-rule match counts, indexed by rule position.
///
/// Surfaced to callers so rule effectiveness can be reported ("rule 2
/// matched 14,203 points").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHistogram(Vec<u64>);

impl RuleHistogram {
    /// Creates a zeroed histogram for `rule_count` rules.
    #[must_use]
    pub fn new(rule_count: usize) -> Self {
        Self(vec![0; rule_count])
    }

    /// Records a match for the rule at `rule_ix`.
    pub fn record(&mut self, rule_ix: usize) {
        if let Some(count) = self.0.get_mut(rule_ix) {
            *count += 1;
        }
    }

    /// Folds another histogram into this one (worker merge).
    pub fn merge(&mut self, other: &Self) {
        for (into, from) in self.0.iter_mut().zip(&other.0) {
            *into += from;
        }
    }

    /// Match counts per rule index.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.0
    }

    /// Total matched points across all rules.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}
