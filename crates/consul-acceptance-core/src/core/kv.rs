// crates/consul-acceptance-core/src/core/kv.rs
// ============================================================================
// Module: KV Pairs
// Description: Key/value payload written by the functional check.
// Purpose: Carry the written pair so the read-back can be compared.
// Dependencies: serde
// ============================================================================

//! KV pair written once and read once per case.

use serde::Serialize;

/// Key and raw value written to the Consul KV store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KvPair {
    /// KV key.
    pub key: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
}

impl KvPair {
    /// Creates a pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
