// crates/consul-acceptance-core/src/lib.rs
// ============================================================================
// Module: Consul Acceptance Core Library
// Description: Public API surface for the Consul acceptance core.
// Purpose: Expose the security matrix, collaborator interfaces, and verifiers.
// Dependencies: crate::{core, interfaces, logging, runtime}
// ============================================================================

//! ## Overview
//! Consul acceptance core drives a freshly installed Consul cluster through a
//! fixed security matrix and checks that it works: a KV write must read back
//! byte-for-byte, and secure installs must carry the auto-generated gossip key
//! on every reported keyring.
//!
//! Deployment, secret access, the Consul data plane, and name generation are
//! reached through the traits in [`interfaces`]; concrete adapters live in
//! `consul-acceptance-providers`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod logging;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ClientError;
pub use interfaces::ClusterDeployer;
pub use interfaces::ConsulClient;
pub use interfaces::DeployError;
pub use interfaces::NameGenerator;
pub use interfaces::SecretData;
pub use interfaces::SecretStore;
pub use interfaces::SecretStoreError;
pub use logging::AcceptanceEvent;
pub use logging::AcceptanceLogSink;
pub use logging::EventKind;
pub use logging::FanoutLogSink;
pub use logging::FileLogSink;
pub use logging::NoopLogSink;
pub use logging::StderrLogSink;
pub use runtime::AssertionError;
pub use runtime::CaseError;
pub use runtime::CaseOutcome;
pub use runtime::CaseReport;
pub use runtime::CaseScope;
pub use runtime::ClusterHandle;
pub use runtime::GossipKeyReport;
pub use runtime::MAX_RELEASE_NAME_ATTEMPTS;
pub use runtime::MatrixReport;
pub use runtime::SuiteContext;
pub use runtime::SuiteSettings;
pub use runtime::check_keyring_entries;
pub use runtime::expected_secret_value;
pub use runtime::key_fingerprint;
pub use runtime::run_case;
pub use runtime::run_matrix;
pub use runtime::verify_gossip_keyring;
pub use runtime::verify_kv_roundtrip;
