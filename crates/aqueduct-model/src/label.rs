// SPDX-License-Identifier: Apache-2.0
//! Human-readable label management.
//!
//! Labels are type-prefixed (`P12`, `J3`), unique per type at commit time,
//! and mutable. The registry is a multiset: the same label may legitimately
//! belong to multiple objects transiently while a moment batch is mid-apply,
//! so occupancy is a count rather than a boolean.

use rustc_hash::FxHashMap;

use crate::asset::AssetType;

/// Registry of labels in use, plus per-type generation counters.
#[derive(Debug, Default, Clone)]
pub struct LabelManager {
    /// Label -> number of registered holders.
    counts: FxHashMap<String, u32>,
    /// Registered label count per asset type; seeds generation.
    per_type: FxHashMap<AssetType, u32>,
}

impl LabelManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one holder of `label`.
    pub fn register(&mut self, asset_type: AssetType, label: &str) {
        *self.counts.entry(label.to_owned()).or_insert(0) += 1;
        *self.per_type.entry(asset_type).or_insert(0) += 1;
    }

    /// Removes one holder of `label`. Unknown labels are a no-op.
    pub fn remove(&mut self, asset_type: AssetType, label: &str) {
        if let Some(count) = self.counts.get_mut(label) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(label);
            }
            if let Some(per_type) = self.per_type.get_mut(&asset_type) {
                *per_type = per_type.saturating_sub(1);
            }
        }
    }

    /// Number of registered holders of `label`.
    #[must_use]
    pub fn count(&self, label: &str) -> u32 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Generates the next free label for `asset_type`.
    ///
    /// The candidate starts at `{prefix}{registered + 1}` and scans forward
    /// past any label already in the registry. The seed tracks the live
    /// count, not a high-water mark: deletions lower it, so a retired label
    /// below the seed stays retired, while enough deletions can bring an
    /// old number back into play.
    ///
    /// Generation does not register: registration happens when the asset is
    /// committed through a moment.
    #[must_use]
    pub fn generate_for(&self, asset_type: AssetType) -> String {
        let prefix = asset_type.label_prefix();
        let mut n = self.per_type.get(&asset_type).copied().unwrap_or(0) + 1;
        loop {
            let candidate = format!("{prefix}{n}");
            if self.count(&candidate) == 0 {
                return candidate;
            }
            n += 1;
        }
    }
}
