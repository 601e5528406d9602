// crates/consul-acceptance-providers/src/consul.rs
// ============================================================================
// Module: Consul HTTP Client
// Description: Blocking client for the KV and operator keyring endpoints.
// Purpose: Serve the acceptance verifiers over Consul's HTTP API.
// Dependencies: consul-acceptance-core, reqwest, serde_json, base64
// ============================================================================

//! ## Overview
//! [`ConsulHttpClient`] talks to a single agent address. Secure clusters are
//! reached over HTTPS with the cluster CA as the only extra trust root, and
//! every request carries the ACL token in the `X-Consul-Token` header.
//! Invariants:
//! - Response bodies are read with a hard byte limit.
//! - Redirects are not followed.
//! - KV keys are percent-encoded per path segment; `/` keeps its hierarchy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use consul_acceptance_core::ClientError;
use consul_acceptance_core::ConsulClient;
use consul_acceptance_core::KeyringEntry;
use reqwest::Certificate;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the ACL token.
pub const CONSUL_TOKEN_HEADER: &str = "X-Consul-Token";

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default response size limit.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Characters of an error body kept in [`ClientError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for one Consul agent.
#[derive(Clone)]
pub struct ConsulClientConfig {
    /// Agent base address, `http://` or `https://`.
    pub address: Url,
    /// ACL token sent with every request.
    pub token: Option<String>,
    /// PEM-encoded CA trusted for HTTPS.
    pub ca_pem: Option<Vec<u8>>,
    /// Timeout for the full request lifecycle.
    pub timeout: Duration,
    /// Maximum response body size, in bytes.
    pub max_response_bytes: usize,
}

impl ConsulClientConfig {
    /// Creates a config with default limits and no credentials.
    #[must_use]
    pub const fn new(address: Url) -> Self {
        Self {
            address,
            token: None,
            ca_pem: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking Consul HTTP API client.
pub struct ConsulHttpClient {
    /// Agent base address.
    base: Url,
    /// ACL token, if any.
    token: Option<String>,
    /// Response size limit.
    max_response_bytes: usize,
    /// Underlying HTTP client.
    client: Client,
}

impl ConsulHttpClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the address is not HTTP(S), the
    /// CA is not valid PEM, or the HTTP client cannot be built.
    pub fn new(config: ConsulClientConfig) -> Result<Self, ClientError> {
        let scheme_ok = matches!(config.address.scheme(), "http" | "https");
        if !scheme_ok || config.address.cannot_be_a_base() {
            let message = format!("unsupported address {}", config.address);
            return Err(transport("client setup", message));
        }
        let mut builder = Client::builder().timeout(config.timeout).redirect(Policy::none());
        if let Some(ca_pem) = &config.ca_pem {
            let cert = Certificate::from_pem(ca_pem)
                .map_err(|err| transport("client setup", format!("invalid ca cert: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|err| transport("client setup", format!("http client build failed: {err}")))?;
        Ok(Self {
            base: config.address,
            token: config.token,
            max_response_bytes: config.max_response_bytes,
            client,
        })
    }

    /// Returns the agent base address.
    #[must_use]
    pub const fn address(&self) -> &Url {
        &self.base
    }

    /// Builds `<base>/v1/<segments...>`, encoding each segment.
    fn endpoint<'s>(
        &self,
        operation: &'static str,
        segments: impl IntoIterator<Item = &'s str>,
    ) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| transport(operation, "address cannot carry a path".to_string()))?;
            path.pop_if_empty().push("v1").extend(segments);
        }
        Ok(url)
    }

    /// Attaches credentials, sends, and reads the bounded body.
    fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let request = match &self.token {
            Some(token) => request.header(CONSUL_TOKEN_HEADER, token),
            None => request,
        };
        let mut response = request.send().map_err(|err| transport(operation, err.to_string()))?;
        let status = response.status();
        let body = read_response_limited(operation, &mut response, self.max_response_bytes)?;
        Ok((status, body))
    }
}

impl ConsulClient for ConsulHttpClient {
    fn kv_put(&self, key: &str, value: &[u8]) -> Result<(), ClientError> {
        const OPERATION: &str = "kv put";
        let url = self.endpoint(OPERATION, kv_segments(key))?;
        let (status, body) = self.send(OPERATION, self.client.put(url).body(value.to_vec()))?;
        ensure_success(OPERATION, status, &body)?;
        let applied: bool = serde_json::from_slice(&body)
            .map_err(|err| decode(OPERATION, format!("expected boolean body: {err}")))?;
        if !applied {
            return Err(decode(OPERATION, format!("write of {key} was not applied")));
        }
        Ok(())
    }

    fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, ClientError> {
        const OPERATION: &str = "kv get";
        let url = self.endpoint(OPERATION, kv_segments(key))?;
        let (status, body) = self.send(OPERATION, self.client.get(url))?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        ensure_success(OPERATION, status, &body)?;
        decode_kv_value(&body)
    }

    fn keyring_list(&self) -> Result<Vec<KeyringEntry>, ClientError> {
        const OPERATION: &str = "keyring list";
        let url = self.endpoint(OPERATION, ["operator", "keyring"])?;
        let (status, body) = self.send(OPERATION, self.client.get(url))?;
        ensure_success(OPERATION, status, &body)?;
        serde_json::from_slice(&body).map_err(|err| decode(OPERATION, err.to_string()))
    }
}

// ============================================================================
// SECTION: Wire Decoding
// ============================================================================

/// One element of a KV read response.
#[derive(Deserialize)]
struct KvEntryWire {
    /// Base64 value; `null` for an empty value.
    #[serde(rename = "Value", default)]
    value: Option<String>,
}

/// Decodes the first entry of a KV read response.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] for malformed JSON or base64.
pub fn decode_kv_value(body: &[u8]) -> Result<Option<Vec<u8>>, ClientError> {
    const OPERATION: &str = "kv get";
    let entries: Vec<KvEntryWire> =
        serde_json::from_slice(body).map_err(|err| decode(OPERATION, err.to_string()))?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };
    match entry.value {
        None => Ok(Some(Vec::new())),
        Some(encoded) => STANDARD
            .decode(encoded.as_bytes())
            .map(Some)
            .map_err(|err| decode(OPERATION, format!("invalid base64 value: {err}"))),
    }
}

/// Splits a KV key into path segments under `kv`.
fn kv_segments(key: &str) -> impl Iterator<Item = &str> {
    std::iter::once("kv").chain(key.trim_start_matches('/').split('/'))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a non-2xx status to [`ClientError::Status`].
fn ensure_success(
    operation: &'static str,
    status: StatusCode,
    body: &[u8],
) -> Result<(), ClientError> {
    if status.is_success() {
        return Ok(());
    }
    let text = String::from_utf8_lossy(body);
    Err(ClientError::Status {
        operation,
        status: status.as_u16(),
        body: text.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    operation: &'static str,
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ClientError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| transport(operation, "response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(transport(operation, format!("response exceeds {max_bytes} bytes")));
    }
    let mut buf = Vec::new();
    response
        .take(max_bytes_u64.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|err| transport(operation, format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(transport(operation, format!("response exceeds {max_bytes} bytes")));
    }
    Ok(buf)
}

/// Builds a transport error.
const fn transport(operation: &'static str, message: String) -> ClientError {
    ClientError::Transport {
        operation,
        message,
    }
}

/// Builds a decode error.
const fn decode(operation: &'static str, message: String) -> ClientError {
    ClientError::Decode {
        operation,
        message,
    }
}
