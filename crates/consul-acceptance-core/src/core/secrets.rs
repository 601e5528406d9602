// crates/consul-acceptance-core/src/core/secrets.rs
// ============================================================================
// Module: Release Secrets
// Description: Names of the secrets the chart writes for a release.
// Purpose: Derive secret references deterministically from a release name.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! The chart stores generated material in secrets named after the release.
//! A [`SecretRef`] pairs the secret name with the data field to read.

use crate::core::identifiers::ReleaseName;

/// A single field inside a named secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    /// Secret name.
    pub name: String,
    /// Data field within the secret.
    pub field: &'static str,
}

impl SecretRef {
    /// Auto-generated gossip encryption key.
    #[must_use]
    pub fn gossip_encryption_key(release: &ReleaseName) -> Self {
        Self {
            name: format!("{release}-consul-gossip-encryption-key"),
            field: "key",
        }
    }

    /// CA certificate used to verify the server's HTTPS listener.
    #[must_use]
    pub fn ca_certificate(release: &ReleaseName) -> Self {
        Self {
            name: format!("{release}-consul-ca-cert"),
            field: "tls.crt",
        }
    }

    /// Bootstrap ACL token with management privileges.
    #[must_use]
    pub fn bootstrap_acl_token(release: &ReleaseName) -> Self {
        Self {
            name: format!("{release}-consul-bootstrap-acl-token"),
            field: "token",
        }
    }
}
