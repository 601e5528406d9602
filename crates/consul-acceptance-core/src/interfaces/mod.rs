// crates/consul-acceptance-core/src/interfaces/mod.rs
// ============================================================================
// Module: Acceptance Interfaces
// Description: Collaborator contracts for deployment, data plane, and secrets.
// Purpose: Keep the verification core independent of Helm, kubectl, and HTTP.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The acceptance core only talks to the outside world through these traits.
//! Every call is synchronous and blocking; timeouts belong to the
//! implementations. Implementations fail closed: a missing or malformed
//! response is an error, never a default value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::KeyringEntry;
use crate::core::OverrideMap;
use crate::core::ReleaseName;

// ============================================================================
// SECTION: Deployment
// ============================================================================

/// Deployment mechanism errors.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Install did not converge.
    #[error("install of {release} failed: {message}")]
    Install {
        /// Release being installed.
        release: String,
        /// Failure detail from the deployment tool.
        message: String,
    },
    /// Uninstall or leftover cleanup failed.
    #[error("teardown of {release} failed: {message}")]
    Teardown {
        /// Release being removed.
        release: String,
        /// Failure detail from the deployment tool.
        message: String,
    },
    /// A client for the release could not be built.
    #[error("client setup for {release} failed: {message}")]
    ClientSetup {
        /// Release the client targets.
        release: String,
        /// Failure detail.
        message: String,
    },
}

/// Installs, reaches, and removes cluster releases.
pub trait ClusterDeployer: Send + Sync {
    /// Installs `release` with `overrides` and blocks until it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Install`] when the install fails or does not
    /// become ready within the deployer's timeout.
    fn create(&self, release: &ReleaseName, overrides: &OverrideMap) -> Result<(), DeployError>;

    /// Builds a data-plane client for `release`. Secure clients carry the
    /// release's CA certificate and bootstrap ACL token.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ClientSetup`] when credentials or connectivity
    /// cannot be established.
    fn client(
        &self,
        release: &ReleaseName,
        secure: bool,
    ) -> Result<Box<dyn ConsulClient>, DeployError>;

    /// Removes every resource created for `release`. Removing a release that
    /// was never installed succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Teardown`] when resources cannot be removed.
    fn destroy(&self, release: &ReleaseName) -> Result<(), DeployError>;
}

// ============================================================================
// SECTION: Data Plane
// ============================================================================

/// Data-plane client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the response could not be read.
    #[error("{operation} transport error: {message}")]
    Transport {
        /// API operation label.
        operation: &'static str,
        /// Failure detail.
        message: String,
    },
    /// Server answered with a non-success status.
    #[error("{operation} returned status {status}: {body}")]
    Status {
        /// API operation label.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// Response body was not in the expected shape.
    #[error("{operation} response decode failed: {message}")]
    Decode {
        /// API operation label.
        operation: &'static str,
        /// Failure detail.
        message: String,
    },
}

/// Consul data-plane operations used by the verifiers.
pub trait ConsulClient: Send {
    /// Writes `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the write is not acknowledged.
    fn kv_put(&self, key: &str, value: &[u8]) -> Result<(), ClientError>;

    /// Reads the value under `key`; `None` when the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the read fails.
    fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, ClientError>;

    /// Lists the gossip keyrings of every pool.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the listing fails.
    fn keyring_list(&self) -> Result<Vec<KeyringEntry>, ClientError>;
}

// ============================================================================
// SECTION: Secret Store
// ============================================================================

/// Decoded secret data keyed by field name.
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Secret store errors.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// Secret does not exist.
    #[error("secret {namespace}/{name} not found")]
    NotFound {
        /// Namespace searched.
        namespace: String,
        /// Secret name.
        name: String,
    },
    /// Secret store call failed.
    #[error("secret {namespace}/{name} lookup failed: {message}")]
    Backend {
        /// Namespace searched.
        namespace: String,
        /// Secret name.
        name: String,
        /// Failure detail.
        message: String,
    },
}

/// Read access to the orchestrated environment's secrets.
pub trait SecretStore: Send + Sync {
    /// Fetches and decodes the secret `name` in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the secret is missing or unreadable.
    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError>;
}

// ============================================================================
// SECTION: Names
// ============================================================================

/// Source of short random names for releases and KV payloads.
pub trait NameGenerator: Send + Sync {
    /// Returns a fresh lowercase DNS-safe name.
    fn random_name(&self) -> String;
}
