// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for the acceptance suite.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: consul-acceptance-core
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed. Values that shape the chart
//! install are turned into the base override map every case is layered over.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use consul_acceptance_core::OverrideMap;
use consul_acceptance_core::SuiteSettings;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Default namespace for installs and secret reads.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default chart reference.
pub const DEFAULT_HELM_CHART: &str = "charts/consul";

/// Default helm `--wait` timeout.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(900);

/// Default data-plane request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment keys for acceptance suite configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional kubeconfig path.
    Kubeconfig,
    /// Optional kube context.
    KubeContext,
    /// Namespace for installs and secrets.
    KubeNamespace,
    /// Chart reference passed to helm.
    HelmChart,
    /// Optional Consul image (`global.image`).
    ConsulImage,
    /// Optional consul-k8s image (`global.imageK8S`).
    ConsulK8sImage,
    /// Enterprise mode (`true`/`false` or `1`/`0`).
    EnableEnterprise,
    /// Enterprise license secret name.
    EnterpriseLicenseSecretName,
    /// Enterprise license secret key.
    EnterpriseLicenseSecretKey,
    /// Leave failed releases installed (`true`/`false` or `1`/`0`).
    NoCleanupOnFailure,
    /// Optional run root override.
    RunRoot,
    /// Helm install timeout in seconds (positive integer).
    InstallTimeoutSeconds,
    /// Data-plane request timeout in seconds (positive integer).
    RequestTimeoutSeconds,
    /// Expected keyring entries per secure cluster (positive integer).
    KeyringEntries,
}

impl SystemTestEnv {
    /// Every key, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Kubeconfig,
        Self::KubeContext,
        Self::KubeNamespace,
        Self::HelmChart,
        Self::ConsulImage,
        Self::ConsulK8sImage,
        Self::EnableEnterprise,
        Self::EnterpriseLicenseSecretName,
        Self::EnterpriseLicenseSecretKey,
        Self::NoCleanupOnFailure,
        Self::RunRoot,
        Self::InstallTimeoutSeconds,
        Self::RequestTimeoutSeconds,
        Self::KeyringEntries,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kubeconfig => "CONSUL_ACCEPTANCE_KUBECONFIG",
            Self::KubeContext => "CONSUL_ACCEPTANCE_KUBE_CONTEXT",
            Self::KubeNamespace => "CONSUL_ACCEPTANCE_KUBE_NAMESPACE",
            Self::HelmChart => "CONSUL_ACCEPTANCE_HELM_CHART",
            Self::ConsulImage => "CONSUL_ACCEPTANCE_CONSUL_IMAGE",
            Self::ConsulK8sImage => "CONSUL_ACCEPTANCE_CONSUL_K8S_IMAGE",
            Self::EnableEnterprise => "CONSUL_ACCEPTANCE_ENABLE_ENTERPRISE",
            Self::EnterpriseLicenseSecretName => "CONSUL_ACCEPTANCE_ENTERPRISE_LICENSE_SECRET_NAME",
            Self::EnterpriseLicenseSecretKey => "CONSUL_ACCEPTANCE_ENTERPRISE_LICENSE_SECRET_KEY",
            Self::NoCleanupOnFailure => "CONSUL_ACCEPTANCE_NO_CLEANUP_ON_FAILURE",
            Self::RunRoot => "CONSUL_ACCEPTANCE_RUN_ROOT",
            Self::InstallTimeoutSeconds => "CONSUL_ACCEPTANCE_INSTALL_TIMEOUT_SEC",
            Self::RequestTimeoutSeconds => "CONSUL_ACCEPTANCE_REQUEST_TIMEOUT_SEC",
            Self::KeyringEntries => "CONSUL_ACCEPTANCE_KEYRING_ENTRIES",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Secret holding the enterprise license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterpriseLicense {
    /// Secret name.
    pub secret_name: String,
    /// Field within the secret.
    pub secret_key: String,
}

/// Typed acceptance configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Optional kubeconfig path.
    pub kubeconfig: Option<PathBuf>,
    /// Optional kube context.
    pub kube_context: Option<String>,
    /// Namespace for installs and secrets.
    pub namespace: String,
    /// Chart reference passed to helm.
    pub helm_chart: String,
    /// Optional Consul image.
    pub consul_image: Option<String>,
    /// Optional consul-k8s image.
    pub consul_k8s_image: Option<String>,
    /// Enterprise license, present only in enterprise mode.
    pub enterprise: Option<EnterpriseLicense>,
    /// Leave failed releases installed for inspection.
    pub no_cleanup_on_failure: bool,
    /// Optional run root override.
    pub run_root: Option<PathBuf>,
    /// Helm install timeout.
    pub install_timeout: Duration,
    /// Data-plane request timeout.
    pub request_timeout: Duration,
    /// Expected keyring entries per secure cluster.
    pub keyring_entries: usize,
}

impl Default for SystemTestConfig {
    fn default() -> Self {
        let settings = SuiteSettings::default();
        Self {
            kubeconfig: None,
            kube_context: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            helm_chart: DEFAULT_HELM_CHART.to_string(),
            consul_image: None,
            consul_k8s_image: None,
            enterprise: None,
            no_cleanup_on_failure: false,
            run_root: None,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            keyring_entries: settings.expected_keyring_entries,
        }
    }
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid timeout or boolean value,
    /// or enterprise mode without a complete license reference).
    pub fn load() -> Result<Self, String> {
        let defaults = Self::default();
        let kubeconfig = read_env_nonempty(SystemTestEnv::Kubeconfig.as_str())?.map(PathBuf::from);
        let kube_context = read_env_nonempty(SystemTestEnv::KubeContext.as_str())?;
        let namespace =
            read_env_nonempty(SystemTestEnv::KubeNamespace.as_str())?.unwrap_or(defaults.namespace);
        let helm_chart =
            read_env_nonempty(SystemTestEnv::HelmChart.as_str())?.unwrap_or(defaults.helm_chart);
        let consul_image = read_env_nonempty(SystemTestEnv::ConsulImage.as_str())?;
        let consul_k8s_image = read_env_nonempty(SystemTestEnv::ConsulK8sImage.as_str())?;
        let enterprise = load_enterprise()?;
        let no_cleanup_on_failure = parse_bool_env(
            SystemTestEnv::NoCleanupOnFailure.as_str(),
            read_env_nonempty(SystemTestEnv::NoCleanupOnFailure.as_str())?,
        )?;
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let install_timeout = read_timeout(SystemTestEnv::InstallTimeoutSeconds)?
            .unwrap_or(defaults.install_timeout);
        let request_timeout = read_timeout(SystemTestEnv::RequestTimeoutSeconds)?
            .unwrap_or(defaults.request_timeout);
        let keyring_entries = read_env_nonempty(SystemTestEnv::KeyringEntries.as_str())?
            .map(|value| parse_positive_count(SystemTestEnv::KeyringEntries.as_str(), &value))
            .transpose()?
            .unwrap_or(defaults.keyring_entries);
        Ok(Self {
            kubeconfig,
            kube_context,
            namespace,
            helm_chart,
            consul_image,
            consul_k8s_image,
            enterprise,
            no_cleanup_on_failure,
            run_root,
            install_timeout,
            request_timeout,
            keyring_entries,
        })
    }

    /// Chart values derived from the environment; cases are layered on top.
    #[must_use]
    pub fn helm_values(&self) -> OverrideMap {
        let mut values = OverrideMap::new();
        if let Some(image) = &self.consul_image {
            values.insert("global.image", image.clone());
        }
        if let Some(image) = &self.consul_k8s_image {
            values.insert("global.imageK8S", image.clone());
        }
        if let Some(license) = &self.enterprise {
            values.insert("global.enterpriseLicense.secretName", license.secret_name.clone());
            values.insert("global.enterpriseLicense.secretKey", license.secret_key.clone());
        }
        values
    }

    /// Runner settings for this configuration.
    #[must_use]
    pub fn suite_settings(&self) -> SuiteSettings {
        SuiteSettings {
            namespace: self.namespace.clone(),
            expected_keyring_entries: self.keyring_entries,
            no_cleanup_on_failure: self.no_cleanup_on_failure,
            base_overrides: self.helm_values(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the enterprise flag and requires a complete license when set.
///
/// # Errors
///
/// Returns an error when enterprise mode lacks a license field, or a license
/// field is set without enterprise mode.
fn load_enterprise() -> Result<Option<EnterpriseLicense>, String> {
    let enabled = parse_bool_env(
        SystemTestEnv::EnableEnterprise.as_str(),
        read_env_nonempty(SystemTestEnv::EnableEnterprise.as_str())?,
    )?;
    let secret_name = read_env_nonempty(SystemTestEnv::EnterpriseLicenseSecretName.as_str())?;
    let secret_key = read_env_nonempty(SystemTestEnv::EnterpriseLicenseSecretKey.as_str())?;
    match (enabled, secret_name, secret_key) {
        (true, Some(secret_name), Some(secret_key)) => Ok(Some(EnterpriseLicense {
            secret_name,
            secret_key,
        })),
        (true, _, _) => Err(format!(
            "{} requires {} and {}",
            SystemTestEnv::EnableEnterprise.as_str(),
            SystemTestEnv::EnterpriseLicenseSecretName.as_str(),
            SystemTestEnv::EnterpriseLicenseSecretKey.as_str(),
        )),
        (false, None, None) => Ok(None),
        (false, _, _) => Err(format!(
            "enterprise license settings require {}",
            SystemTestEnv::EnableEnterprise.as_str()
        )),
    }
}

/// Reads an optional timeout key.
fn read_timeout(key: SystemTestEnv) -> Result<Option<Duration>, String> {
    read_env_nonempty(key.as_str())?
        .map(|value| parse_timeout_seconds(key.as_str(), &value))
        .transpose()
}

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    parse_positive_count(name, raw)
        .and_then(|secs| u64::try_from(secs).map_err(|_| format!("{name} is out of range")))
        .map(Duration::from_secs)
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))
}

/// Parses a positive integer.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_positive_count(name: &str, raw: &str) -> Result<usize, String> {
    let value: usize =
        raw.trim().parse().map_err(|_| format!("{name} must be a positive integer"))?;
    if value == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(value)
}

/// Parses a boolean environment variable with permissive defaults.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, String> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}
