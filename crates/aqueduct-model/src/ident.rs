// SPDX-License-Identifier: Apache-2.0
//! Identifier types and the internal id generator.

use std::fmt;

/// Stable identifier for a network asset.
///
/// Ids are opaque strings assigned by the caller (import, UI) or by
/// [`IdGenerator`]. They never change for the lifetime of an asset; labels
/// are the mutable, human-facing handle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetId(String);

impl AssetId {
    /// Creates an id from its string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id's string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Stable identifier for a customer demand point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomerPointId(String);

impl CustomerPointId {
    /// Creates an id from its string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id's string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerPointId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Issues unique internal asset ids.
///
/// Ids are `a{n}` over a monotonically increasing counter. The generator
/// skips any id the supplied predicate reports as taken, so it stays
/// collision-free against ids that arrived from imports.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Creates a generator starting at `a1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id not reported taken by `is_taken`.
    pub fn generate(&mut self, mut is_taken: impl FnMut(&AssetId) -> bool) -> AssetId {
        loop {
            self.next += 1;
            let candidate = AssetId::new(format!("a{}", self.next));
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}
