// crates/consul-acceptance-core/src/core/case.rs
// ============================================================================
// Module: Security Matrix
// Description: Configuration cases exercised by the basic-installation suite.
// Purpose: Enumerate security postures and derive their chart overrides.
// Dependencies: crate::core::overrides, serde
// ============================================================================

//! ## Overview
//! The security matrix is a fixed, ordered list of immutable cases. Each case
//! yields a human-readable label used to attribute failures and the override
//! map passed to the cluster install.
//!
//! Invariants:
//! - `auto_encrypt` implies `secure` for every case in [`SECURITY_MATRIX`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::overrides::OverrideKey;
use crate::core::overrides::OverrideMap;

// ============================================================================
// SECTION: Configuration Case
// ============================================================================

/// One security posture to install and verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationCase {
    /// TLS, ACLs, and gossip encryption enabled together.
    pub secure: bool,
    /// Auto-encrypt for client certificates.
    pub auto_encrypt: bool,
}

/// Cases run by the basic-installation suite, in order.
pub const SECURITY_MATRIX: [ConfigurationCase; 3] = [
    ConfigurationCase::new(false, false),
    ConfigurationCase::new(true, false),
    ConfigurationCase::new(true, true),
];

impl ConfigurationCase {
    /// Creates a case.
    #[must_use]
    pub const fn new(secure: bool, auto_encrypt: bool) -> Self {
        Self {
            secure,
            auto_encrypt,
        }
    }

    /// Returns true when the case respects `auto_encrypt => secure`.
    #[must_use]
    pub const fn is_consistent(self) -> bool {
        self.secure || !self.auto_encrypt
    }

    /// Returns the label naming this case in reports.
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }

    /// Builds the chart overrides for this case.
    #[must_use]
    pub fn overrides(self) -> OverrideMap {
        let mut overrides = OverrideMap::new();
        overrides.set_flag(OverrideKey::ManageSystemAcls, self.secure);
        overrides.set_flag(OverrideKey::TlsEnabled, self.secure);
        overrides.set_flag(OverrideKey::GossipAutoGenerate, self.secure);
        overrides.set_flag(OverrideKey::TlsAutoEncrypt, self.auto_encrypt);
        overrides
    }
}

impl fmt::Display for ConfigurationCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "secure: {}, auto-encrypt: {}", self.secure, self.auto_encrypt)
    }
}
