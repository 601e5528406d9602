// crates/consul-acceptance-core/src/core/keyring.rs
// ============================================================================
// Module: Keyring Entries
// Description: One gossip pool's view of its active encryption keys.
// Purpose: Decode the operator keyring listing into a typed view.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Consul reports one keyring entry per gossip pool. A single-datacenter
//! install reports the WAN pool of the servers and the LAN pool of the
//! datacenter. `keys` maps each installed key to the number of members that
//! hold it; membership of a key is what the verifier checks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Keyring Entry
// ============================================================================

/// Keys installed on one gossip pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyringEntry {
    /// True for the WAN pool.
    #[serde(rename = "WAN", default)]
    pub wan: bool,
    /// Datacenter reporting the pool.
    #[serde(rename = "Datacenter", default)]
    pub datacenter: String,
    /// Network segment for LAN pools.
    #[serde(rename = "Segment", default)]
    pub segment: String,
    /// Installed keys and how many members hold each.
    #[serde(rename = "Keys", default)]
    pub keys: BTreeMap<String, u32>,
    /// Members in the pool.
    #[serde(rename = "NumNodes", default)]
    pub num_nodes: u32,
}

impl KeyringEntry {
    /// Returns true when `key` is installed on this pool.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Installed keys in sorted order.
    #[must_use]
    pub fn key_names(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    /// Short pool label for diagnostics, for example `LAN dc1`.
    #[must_use]
    pub fn pool_label(&self) -> String {
        let pool = if self.wan { "WAN" } else { "LAN" };
        match (self.datacenter.is_empty(), self.segment.is_empty()) {
            (true, _) => pool.to_string(),
            (false, true) => format!("{pool} {}", self.datacenter),
            (false, false) => format!("{pool} {}/{}", self.datacenter, self.segment),
        }
    }
}
