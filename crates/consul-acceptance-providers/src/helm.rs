// crates/consul-acceptance-providers/src/helm.rs
// ============================================================================
// Module: Helm Deployer
// Description: Cluster lifecycle through helm install/uninstall and kubectl.
// Purpose: Install one Consul release per case and reach it from the host.
// Dependencies: consul-acceptance-core, crate::{consul, kube}
// ============================================================================

//! ## Overview
//! [`HelmDeployer`] installs the chart with `helm install --wait`, so a
//! successful install means every pod reported ready. Clients reach the first
//! server pod through a port-forward; secure clients add the release CA and
//! bootstrap ACL token read from the release's secrets. Teardown uninstalls
//! the release and removes the labelled objects helm leaves behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use consul_acceptance_core::ClientError;
use consul_acceptance_core::ClusterDeployer;
use consul_acceptance_core::ConsulClient;
use consul_acceptance_core::DeployError;
use consul_acceptance_core::KeyringEntry;
use consul_acceptance_core::OverrideMap;
use consul_acceptance_core::ReleaseName;
use consul_acceptance_core::SecretRef;
use consul_acceptance_core::SecretStore;
use consul_acceptance_core::expected_secret_value;
use reqwest::Url;

use crate::consul::ConsulClientConfig;
use crate::consul::ConsulHttpClient;
use crate::consul::DEFAULT_MAX_RESPONSE_BYTES;
use crate::consul::DEFAULT_REQUEST_TIMEOUT;
use crate::kube::KubeTarget;
use crate::kube::KubectlSecretStore;
use crate::kube::PortForward;
use crate::kube::run_tool;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Consul HTTP port.
pub const CONSUL_HTTP_PORT: u16 = 8500;

/// Consul HTTPS port.
pub const CONSUL_HTTPS_PORT: u16 = 8501;

/// Default helm `--wait` timeout.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(900);

/// Default deadline for a port-forward to accept connections.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Object kinds removed by label after uninstall.
const LEFTOVER_KINDS: &str = "pvc,secret,serviceaccount";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Helm deployer settings.
#[derive(Debug, Clone)]
pub struct HelmSettings {
    /// helm program.
    pub helm: String,
    /// kubectl program.
    pub kubectl: String,
    /// Chart reference passed to `helm install`.
    pub chart: String,
    /// Cluster and namespace.
    pub target: KubeTarget,
    /// helm `--wait` timeout.
    pub install_timeout: Duration,
    /// Deadline for the port-forward to become ready.
    pub forward_timeout: Duration,
    /// Data-plane request timeout.
    pub request_timeout: Duration,
    /// Data-plane response size limit.
    pub max_response_bytes: usize,
}

impl HelmSettings {
    /// Settings for `chart` in `target` with default tools and limits.
    #[must_use]
    pub fn new(chart: impl Into<String>, target: KubeTarget) -> Self {
        Self {
            helm: "helm".to_string(),
            kubectl: "kubectl".to_string(),
            chart: chart.into(),
            target,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
            forward_timeout: DEFAULT_FORWARD_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Builds the `helm install` arguments.
#[must_use]
pub fn install_args(
    settings: &HelmSettings,
    release: &ReleaseName,
    overrides: &OverrideMap,
) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        release.to_string(),
        settings.chart.clone(),
        "--wait".to_string(),
        "--timeout".to_string(),
        format!("{}s", settings.install_timeout.as_secs()),
    ];
    args.extend(settings.target.helm_args());
    for (path, value) in overrides.iter() {
        args.push("--set".to_string());
        args.push(format!("{path}={}", escape_set_value(value)));
    }
    args
}

/// Builds the `helm uninstall` arguments.
#[must_use]
pub fn uninstall_args(settings: &HelmSettings, release: &ReleaseName) -> Vec<String> {
    let mut args = vec!["uninstall".to_string(), release.to_string(), "--wait".to_string()];
    args.extend(settings.target.helm_args());
    args
}

/// Builds the `kubectl delete` arguments for objects labelled with `release`.
#[must_use]
pub fn leftover_cleanup_args(settings: &HelmSettings, release: &ReleaseName) -> Vec<String> {
    let mut args = vec![
        "delete".to_string(),
        LEFTOVER_KINDS.to_string(),
        "--selector".to_string(),
        format!("release={release}"),
        "--ignore-not-found".to_string(),
    ];
    args.extend(settings.target.kubectl_args());
    args
}

/// Escapes characters `helm --set` treats as separators.
fn escape_set_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,")
}

// ============================================================================
// SECTION: Deployer
// ============================================================================

/// Deploys Consul releases with helm and reaches them with kubectl.
pub struct HelmDeployer {
    /// Tool and cluster settings.
    settings: HelmSettings,
    /// Reads the CA and ACL token secrets.
    secrets: KubectlSecretStore,
}

impl HelmDeployer {
    /// Creates a deployer for `settings`.
    #[must_use]
    pub fn new(settings: HelmSettings) -> Self {
        let secrets = KubectlSecretStore::new(settings.kubectl.clone(), settings.target.clone());
        Self {
            settings,
            secrets,
        }
    }

    /// Returns the deployer settings.
    #[must_use]
    pub const fn settings(&self) -> &HelmSettings {
        &self.settings
    }

    /// Reads one trimmed text field from a release secret.
    fn read_secret_text(&self, secret: &SecretRef) -> Result<String, String> {
        let data = self
            .secrets
            .get_secret(&self.settings.target.namespace, &secret.name)
            .map_err(|err| err.to_string())?;
        expected_secret_value(secret, &data).map_err(|err| err.to_string())
    }

    /// Assembles the client config for a forwarded port.
    fn client_config(
        &self,
        release: &ReleaseName,
        local_port: u16,
        secure: bool,
    ) -> Result<ConsulClientConfig, String> {
        let scheme = if secure { "https" } else { "http" };
        let address = Url::parse(&format!("{scheme}://127.0.0.1:{local_port}"))
            .map_err(|err| format!("invalid forwarded address: {err}"))?;
        let mut config = ConsulClientConfig::new(address);
        config.timeout = self.settings.request_timeout;
        config.max_response_bytes = self.settings.max_response_bytes;
        if secure {
            let ca = self.read_secret_text(&SecretRef::ca_certificate(release))?;
            config.ca_pem = Some(ca.into_bytes());
            config.token = Some(self.read_secret_text(&SecretRef::bootstrap_acl_token(release))?);
        }
        Ok(config)
    }
}

impl ClusterDeployer for HelmDeployer {
    fn create(&self, release: &ReleaseName, overrides: &OverrideMap) -> Result<(), DeployError> {
        run_tool(&self.settings.helm, &install_args(&self.settings, release, overrides))
            .map(|_| ())
            .map_err(|err| DeployError::Install {
                release: release.to_string(),
                message: err.to_string(),
            })
    }

    fn client(
        &self,
        release: &ReleaseName,
        secure: bool,
    ) -> Result<Box<dyn ConsulClient>, DeployError> {
        let setup_error = |message: String| DeployError::ClientSetup {
            release: release.to_string(),
            message,
        };
        let remote_port = if secure { CONSUL_HTTPS_PORT } else { CONSUL_HTTP_PORT };
        let forward = PortForward::start(
            &self.settings.kubectl,
            &self.settings.target,
            &release.server_pod(0),
            remote_port,
            self.settings.forward_timeout,
        )
        .map_err(setup_error)?;
        let config =
            self.client_config(release, forward.local_addr().port(), secure).map_err(setup_error)?;
        let client = ConsulHttpClient::new(config).map_err(|err| setup_error(err.to_string()))?;
        Ok(Box::new(TunneledClient {
            client,
            _forward: forward,
        }))
    }

    fn destroy(&self, release: &ReleaseName) -> Result<(), DeployError> {
        let mut failures = Vec::new();
        if let Err(err) = run_tool(&self.settings.helm, &uninstall_args(&self.settings, release))
            && !err.is_not_found()
        {
            failures.push(err.to_string());
        }
        if let Err(err) =
            run_tool(&self.settings.kubectl, &leftover_cleanup_args(&self.settings, release))
        {
            failures.push(err.to_string());
        }
        if failures.is_empty() {
            return Ok(());
        }
        Err(DeployError::Teardown {
            release: release.to_string(),
            message: failures.join("; "),
        })
    }
}

// ============================================================================
// SECTION: Tunneled Client
// ============================================================================

/// Consul client that keeps its port-forward alive.
struct TunneledClient {
    /// Client bound to the forwarded port.
    client: ConsulHttpClient,
    /// Tunnel closed when the client is dropped.
    _forward: PortForward,
}

impl ConsulClient for TunneledClient {
    fn kv_put(&self, key: &str, value: &[u8]) -> Result<(), ClientError> {
        self.client.kv_put(key, value)
    }

    fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, ClientError> {
        self.client.kv_get(key)
    }

    fn keyring_list(&self) -> Result<Vec<KeyringEntry>, ClientError> {
        self.client.keyring_list()
    }
}
