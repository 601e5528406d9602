// crates/consul-acceptance-core/src/core/mod.rs
// ============================================================================
// Module: Consul Acceptance Core Types
// Description: Data model for the basic-installation acceptance matrix.
// Purpose: Group identifiers, cases, overrides, secrets, and keyring views.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Plain data types shared by the runtime and the collaborator adapters. None
//! of these types perform I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod case;
pub mod identifiers;
pub mod keyring;
pub mod kv;
pub mod overrides;
pub mod secrets;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use case::ConfigurationCase;
pub use case::SECURITY_MATRIX;
pub use identifiers::IdentifierError;
pub use identifiers::MAX_RELEASE_NAME_LEN;
pub use identifiers::ReleaseName;
pub use keyring::KeyringEntry;
pub use kv::KvPair;
pub use overrides::OverrideKey;
pub use overrides::OverrideMap;
pub use secrets::SecretRef;
