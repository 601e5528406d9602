// crates/consul-acceptance-core/src/runtime/mod.rs
// ============================================================================
// Module: Acceptance Runtime
// Description: Case runner, cluster lifecycle guard, and verifiers.
// Purpose: Execute the security matrix against the collaborator interfaces.
// Dependencies: crate::{core, interfaces, logging}
// ============================================================================

//! ## Overview
//! The runtime walks the security matrix. Each case allocates a unique
//! release, installs it behind a [`ClusterHandle`] guard, runs the KV
//! round-trip and (for secure cases) the gossip keyring check, and tears the
//! release down on every exit path.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod error;
pub mod handle;
pub mod runner;
pub mod verify;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::CaseScope;
pub use context::SuiteContext;
pub use context::SuiteSettings;
pub use error::AssertionError;
pub use error::CaseError;
pub use handle::ClusterHandle;
pub use runner::CaseOutcome;
pub use runner::CaseReport;
pub use runner::MAX_RELEASE_NAME_ATTEMPTS;
pub use runner::MatrixReport;
pub use runner::run_case;
pub use runner::run_matrix;
pub use verify::GossipKeyReport;
pub use verify::check_keyring_entries;
pub use verify::expected_secret_value;
pub use verify::key_fingerprint;
pub use verify::verify_gossip_keyring;
pub use verify::verify_kv_roundtrip;
