// crates/consul-acceptance-core/src/core/overrides.rs
// ============================================================================
// Module: Chart Overrides
// Description: Dotted-path value overrides handed to the deployment mechanism.
// Purpose: Build deterministic, string-encoded override maps per case.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Overrides map a dotted chart path (for example `global.tls.enabled`) to a
//! string value. Maps are ordered so the rendered `--set` arguments are stable
//! across runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

// ============================================================================
// SECTION: Override Keys
// ============================================================================

/// Security toggles the matrix drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverrideKey {
    /// ACL bootstrapping and management by the chart.
    ManageSystemAcls,
    /// TLS for agent and HTTP traffic.
    TlsEnabled,
    /// Gossip key generation by the chart.
    GossipAutoGenerate,
    /// Auto-encrypt client certificate distribution.
    TlsAutoEncrypt,
}

impl OverrideKey {
    /// Every key the security matrix sets, in rendering order.
    pub const ALL: [Self; 4] =
        [Self::ManageSystemAcls, Self::TlsEnabled, Self::GossipAutoGenerate, Self::TlsAutoEncrypt];

    /// Returns the dotted chart path for the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageSystemAcls => "global.acls.manageSystemACLs",
            Self::TlsEnabled => "global.tls.enabled",
            Self::GossipAutoGenerate => "global.gossipEncryption.autoGenerate",
            Self::TlsAutoEncrypt => "global.tls.enableAutoEncrypt",
        }
    }
}

// ============================================================================
// SECTION: Override Map
// ============================================================================

/// Ordered map of chart path to string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OverrideMap(BTreeMap<String, String>);

impl OverrideMap {
    /// Creates an empty override map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `path` to `value`, replacing any earlier value.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.0.insert(path.into(), value.into());
    }

    /// Sets a matrix toggle to its canonical boolean string.
    pub fn set_flag(&mut self, key: OverrideKey, enabled: bool) {
        self.insert(key.as_str(), enabled.to_string());
    }

    /// Returns the value stored for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Returns the value stored for a matrix toggle.
    #[must_use]
    pub fn flag(&self, key: OverrideKey) -> Option<&str> {
        self.get(key.as_str())
    }

    /// Returns the number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no overrides are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates overrides in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(path, value)| (path.as_str(), value.as_str()))
    }

    /// Returns `self` layered over `base`; entries in `self` win on collision.
    #[must_use]
    pub fn layered_over(&self, base: &Self) -> Self {
        let mut merged = base.clone();
        for (path, value) in &self.0 {
            merged.0.insert(path.clone(), value.clone());
        }
        merged
    }
}

impl FromIterator<(String, String)> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
