// crates/consul-acceptance-core/src/core/identifiers.rs
// ============================================================================
// Module: Release Identifiers
// Description: Validated release names for per-case cluster installs.
// Purpose: Keep release names usable as Helm releases and Kubernetes prefixes.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A release name identifies one installed cluster within the orchestrated
//! environment. Every resource the chart creates is prefixed with it, so the
//! name must be a DNS-1123 label no longer than Helm's release limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum release name length accepted by Helm.
pub const MAX_RELEASE_NAME_LEN: usize = 53;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Release name validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Name was empty.
    #[error("release name must not be empty")]
    Empty,
    /// Name exceeds [`MAX_RELEASE_NAME_LEN`].
    #[error("release name {name} exceeds {max} characters")]
    TooLong {
        /// Offending name.
        name: String,
        /// Maximum accepted length.
        max: usize,
    },
    /// Name contains a character outside `[a-z0-9-]` or has a leading or
    /// trailing hyphen.
    #[error("release name {0} must be lowercase alphanumeric with inner hyphens")]
    InvalidCharacters(String),
}

// ============================================================================
// SECTION: Release Name
// ============================================================================

/// Unique name of one installed cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ReleaseName(String);

impl ReleaseName {
    /// Validates and wraps a release name.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the name is empty, too long, or not a
    /// DNS-1123 label.
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if name.len() > MAX_RELEASE_NAME_LEN {
            return Err(IdentifierError::TooLong {
                name,
                max: MAX_RELEASE_NAME_LEN,
            });
        }
        let valid_chars = name
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-');
        if !valid_chars || name.starts_with('-') || name.ends_with('-') {
            return Err(IdentifierError::InvalidCharacters(name));
        }
        Ok(Self(name))
    }

    /// Returns the release name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name of the `index`-th Consul server pod of this release.
    #[must_use]
    pub fn server_pod(&self, index: u32) -> String {
        format!("{}-consul-server-{index}", self.0)
    }
}

impl fmt::Display for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for ReleaseName {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ReleaseName {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
