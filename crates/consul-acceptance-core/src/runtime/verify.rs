// crates/consul-acceptance-core/src/runtime/verify.rs
// ============================================================================
// Module: Verifiers
// Description: KV round-trip and gossip keyring consistency checks.
// Purpose: Assert that a ready release serves data and shares its gossip key.
// Dependencies: crate::{core, interfaces, logging, runtime}
// ============================================================================

//! ## Overview
//! Both verifiers are single-shot: the first failed call or assertion aborts
//! the case. Nothing is retried, since a release is only handed to the
//! verifiers after the deployer reported it ready.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::KeyringEntry;
use crate::core::KvPair;
use crate::core::SecretRef;
use crate::interfaces::ConsulClient;
use crate::interfaces::SecretData;
use crate::logging::EventKind;
use crate::runtime::context::CaseScope;
use crate::runtime::context::SuiteContext;
use crate::runtime::error::AssertionError;
use crate::runtime::error::CaseError;

// ============================================================================
// SECTION: Functional Verifier
// ============================================================================

/// Writes a random KV pair and requires the read-back to match byte-for-byte.
///
/// # Errors
///
/// Returns [`CaseError::Client`] when the put or get fails and
/// [`CaseError::Assertion`] when the key is missing or the value differs.
pub fn verify_kv_roundtrip(
    ctx: &SuiteContext,
    scope: &CaseScope,
    client: &dyn ConsulClient,
) -> Result<KvPair, CaseError> {
    let pair = KvPair::new(ctx.names().random_name(), ctx.names().random_name().into_bytes());

    scope.emit(ctx, EventKind::KvWrite, format!("creating KV entry with key {}", pair.key));
    client.kv_put(&pair.key, &pair.value)?;

    scope.emit(ctx, EventKind::KvRead, format!("reading value for key {}", pair.key));
    let stored = client.kv_get(&pair.key)?.ok_or_else(|| AssertionError::KeyNotFound {
        key: pair.key.clone(),
    })?;
    if stored != pair.value {
        return Err(AssertionError::ValueMismatch {
            key: pair.key.clone(),
            expected: render_bytes(&pair.value),
            actual: render_bytes(&stored),
        }
        .into());
    }
    Ok(pair)
}

/// Renders a KV value for diagnostics: quoted text when UTF-8, hex otherwise.
fn render_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => format!("\"{text}\""),
        Err(_) => {
            let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
            format!("0x{hex}")
        }
    }
}

// ============================================================================
// SECTION: Keyring Consistency Verifier
// ============================================================================

/// Outcome of a successful gossip keyring check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GossipKeyReport {
    /// Secret the expected key was read from.
    pub secret_name: String,
    /// Pool labels of the entries that carried the key.
    pub pools: Vec<String>,
}

/// Requires every reported keyring to hold the gossip key stored for the
/// case's release.
///
/// # Errors
///
/// Returns [`CaseError::Secret`] when the secret cannot be read,
/// [`CaseError::Client`] when the keyring listing fails, and
/// [`CaseError::Assertion`] when the key or entry count does not match.
pub fn verify_gossip_keyring(
    ctx: &SuiteContext,
    scope: &CaseScope,
    client: &dyn ConsulClient,
) -> Result<GossipKeyReport, CaseError> {
    let secret = SecretRef::gossip_encryption_key(&scope.release);
    scope.emit(
        ctx,
        EventKind::KeyringCheck,
        format!("checking keyrings against secret {}", secret.name),
    );

    let data = ctx.secrets().get_secret(&ctx.settings().namespace, &secret.name)?;
    let expected_key = expected_secret_value(&secret, &data)?;

    let entries = client.keyring_list()?;
    check_keyring_entries(&expected_key, &entries, ctx.settings().expected_keyring_entries)?;

    let pools: Vec<String> = entries.iter().map(KeyringEntry::pool_label).collect();
    scope.emit(
        ctx,
        EventKind::KeyringVerified,
        format!("gossip key active on {} keyrings: {}", pools.len(), pools.join(", ")),
    );
    Ok(GossipKeyReport {
        secret_name: secret.name,
        pools,
    })
}

/// Extracts the trimmed text stored in `secret`'s field.
///
/// # Errors
///
/// Returns [`AssertionError`] when the field is missing, not UTF-8, or blank.
pub fn expected_secret_value(
    secret: &SecretRef,
    data: &SecretData,
) -> Result<String, AssertionError> {
    let raw = data.get(secret.field).ok_or_else(|| AssertionError::SecretFieldMissing {
        secret: secret.name.clone(),
        field: secret.field,
    })?;
    let text = std::str::from_utf8(raw).map_err(|_| AssertionError::SecretNotUtf8 {
        secret: secret.name.clone(),
        field: secret.field,
    })?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AssertionError::SecretEmpty {
            secret: secret.name.clone(),
            field: secret.field,
        });
    }
    Ok(trimmed.to_string())
}

/// Requires exactly `expected_count` entries, each holding `expected_key`.
///
/// # Errors
///
/// Returns [`AssertionError::KeyringEntryCount`] on a cardinality mismatch and
/// [`AssertionError::KeyringMissingKey`] for the first entry lacking the key.
/// Keys appear in the error only as [`key_fingerprint`]s.
pub fn check_keyring_entries(
    expected_key: &str,
    entries: &[KeyringEntry],
    expected_count: usize,
) -> Result<(), AssertionError> {
    if entries.len() != expected_count {
        return Err(AssertionError::KeyringEntryCount {
            expected: expected_count,
            actual: entries.len(),
        });
    }
    for (index, entry) in entries.iter().enumerate() {
        if !entry.contains_key(expected_key) {
            return Err(AssertionError::KeyringMissingKey {
                index,
                pool: entry.pool_label(),
                expected_key: key_fingerprint(expected_key),
                installed: entry
                    .key_names()
                    .iter()
                    .map(|key| key_fingerprint(key))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    }
    Ok(())
}

/// Shortest key that still shows a prefix in its fingerprint.
const FINGERPRINT_MIN_LEN: usize = 16;

/// Characters of a key shown in its fingerprint.
const FINGERPRINT_PREFIX_LEN: usize = 4;

/// Non-secret stand-in for a gossip key: a short prefix and the length.
///
/// Keys shorter than 16 characters show only their length.
#[must_use]
pub fn key_fingerprint(key: &str) -> String {
    let len = key.chars().count();
    if len < FINGERPRINT_MIN_LEN {
        return format!("<{len} chars>");
    }
    let prefix: String = key.chars().take(FINGERPRINT_PREFIX_LEN).collect();
    format!("{prefix}...<{len} chars>")
}
