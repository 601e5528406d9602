// crates/consul-acceptance-core/src/runtime/error.rs
// ============================================================================
// Module: Case Errors
// Description: Failure taxonomy for acceptance cases.
// Purpose: Surface every case failure as one typed, attributable error.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! A case fails on the first error. Setup, data-plane, and secret failures
//! wrap the collaborator error; assertion failures carry the expected and
//! actual values; panics inside a case are captured with their message.

use thiserror::Error;

use crate::interfaces::ClientError;
use crate::interfaces::DeployError;
use crate::interfaces::SecretStoreError;

// ============================================================================
// SECTION: Assertion Errors
// ============================================================================

/// Verification assertions that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    /// Key written by the functional check was absent on read-back.
    #[error("key {key} not found on read-back")]
    KeyNotFound {
        /// KV key.
        key: String,
    },
    /// Read-back value differs from the written value.
    #[error("value mismatch for key {key}: wrote {expected}, read {actual}")]
    ValueMismatch {
        /// KV key.
        key: String,
        /// Rendered written value.
        expected: String,
        /// Rendered read value.
        actual: String,
    },
    /// Secret lacks the expected field.
    #[error("secret {secret} has no field {field}")]
    SecretFieldMissing {
        /// Secret name.
        secret: String,
        /// Missing field.
        field: &'static str,
    },
    /// Secret field is not UTF-8 text.
    #[error("secret {secret} field {field} is not valid UTF-8")]
    SecretNotUtf8 {
        /// Secret name.
        secret: String,
        /// Field name.
        field: &'static str,
    },
    /// Secret field is empty after trimming.
    #[error("secret {secret} field {field} is empty")]
    SecretEmpty {
        /// Secret name.
        secret: String,
        /// Field name.
        field: &'static str,
    },
    /// Keyring listing has the wrong number of entries.
    #[error("expected {expected} keyring entries, found {actual}")]
    KeyringEntryCount {
        /// Configured entry count.
        expected: usize,
        /// Entries reported.
        actual: usize,
    },
    /// A keyring entry does not hold the expected gossip key.
    #[error(
        "keyring entry {index} ({pool}) does not contain gossip key {expected_key}; installed: [{installed}]"
    )]
    KeyringMissingKey {
        /// Position of the entry in the listing.
        index: usize,
        /// Pool label of the entry.
        pool: String,
        /// Fingerprint of the key read from the secret store.
        expected_key: String,
        /// Fingerprints of the keys the entry reported, comma separated.
        installed: String,
    },
}

// ============================================================================
// SECTION: Case Errors
// ============================================================================

/// Fatal failure of one acceptance case.
#[derive(Debug, Error)]
pub enum CaseError {
    /// No unique, valid release name could be allocated.
    #[error("release name allocation failed: {0}")]
    ReleaseName(String),
    /// Install, client setup, or teardown failed.
    #[error(transparent)]
    Deploy(#[from] DeployError),
    /// Data-plane request failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// Secret lookup failed.
    #[error(transparent)]
    Secret(#[from] SecretStoreError),
    /// Verification assertion failed.
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionError),
    /// Case panicked.
    #[error("case panicked: {0}")]
    Panicked(String),
}

impl CaseError {
    /// Returns a stable failure category label.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::ReleaseName(_) => "setup",
            Self::Deploy(DeployError::Teardown {
                ..
            }) => "teardown",
            Self::Deploy(_) => "setup",
            Self::Client(_) => "data_plane",
            Self::Secret(_) => "secret_store",
            Self::Assertion(_) => "assertion",
            Self::Panicked(_) => "panic",
        }
    }
}
