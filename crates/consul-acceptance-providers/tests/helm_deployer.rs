// crates/consul-acceptance-providers/tests/helm_deployer.rs
// ============================================================================
// Module: Helm Deployer Tests
// Description: Lifecycle calls against scripted helm and kubectl stand-ins.
// Purpose: Verify install, teardown, and secret reads without a cluster.
// Dependencies: consul-acceptance-providers, tempfile
// ============================================================================

//! ## Overview
//! Stand-in tools are shell scripts that append their arguments to a log
//! file. Tests serialize on a lock so no script is executed while another
//! test still holds it open for writing.

#![cfg(unix)]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use consul_acceptance_core::ClusterDeployer;
use consul_acceptance_core::ConfigurationCase;
use consul_acceptance_core::DeployError;
use consul_acceptance_core::ReleaseName;
use consul_acceptance_core::SecretStore;
use consul_acceptance_core::SecretStoreError;
use consul_acceptance_providers::HelmDeployer;
use consul_acceptance_providers::HelmSettings;
use consul_acceptance_providers::KubeTarget;
use consul_acceptance_providers::KubectlSecretStore;
use tempfile::TempDir;

// ============================================================================
// SECTION: Stand-in Tools
// ============================================================================

static TOOL_LOCK: Mutex<()> = Mutex::new(());

/// Scripted tools sharing one invocation log.
struct Tools {
    _guard: MutexGuard<'static, ()>,
    dir: TempDir,
    log: PathBuf,
}

impl Tools {
    fn new() -> Self {
        let guard = TOOL_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        Self {
            _guard: guard,
            dir,
            log,
        }
    }

    /// Writes an executable script whose body runs after logging its args.
    fn script(&self, name: &str, body: &str) -> String {
        let path = self.dir.path().join(name);
        let text = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"{}\"\n{body}\n",
            self.log.display()
        );
        fs::write(&path, text).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    fn calls(&self) -> Vec<String> {
        read_lines(&self.log)
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path).unwrap_or_default().lines().map(str::to_string).collect()
}

fn settings(tools: &Tools, helm_body: &str, kubectl_body: &str) -> HelmSettings {
    let mut settings = HelmSettings::new("charts/consul", KubeTarget::new("acceptance"));
    settings.helm = tools.script("helm", helm_body);
    settings.kubectl = tools.script("kubectl", kubectl_body);
    settings.install_timeout = Duration::from_secs(60);
    settings.forward_timeout = Duration::from_secs(2);
    settings
}

fn release() -> ReleaseName {
    ReleaseName::new("test-deploy01").unwrap()
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[test]
fn create_runs_helm_install_with_case_overrides() {
    let tools = Tools::new();
    let deployer = HelmDeployer::new(settings(&tools, "exit 0", "exit 0"));

    deployer.create(&release(), &ConfigurationCase::new(true, false).overrides()).unwrap();

    let calls = tools.calls();
    assert_eq!(calls.len(), 1);
    let install = &calls[0];
    assert!(install.starts_with("helm install test-deploy01 charts/consul --wait --timeout 60s"));
    assert!(install.contains("--namespace acceptance"));
    assert!(install.contains("--set global.tls.enabled=true"));
    assert!(install.contains("--set global.tls.enableAutoEncrypt=false"));
}

#[test]
fn failed_install_surfaces_helm_stderr() {
    let tools = Tools::new();
    let helm = "echo 'Error: timed out waiting for the condition' >&2\nexit 1";
    let deployer = HelmDeployer::new(settings(&tools, helm, "exit 0"));

    let err = deployer.create(&release(), &ConfigurationCase::new(false, false).overrides());

    match err {
        Err(DeployError::Install {
            release,
            message,
        }) => {
            assert_eq!(release, "test-deploy01");
            assert!(message.contains("timed out waiting for the condition"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn destroy_tolerates_missing_release_and_cleans_leftovers() {
    let tools = Tools::new();
    let helm = "echo 'Error: uninstall: Release not loaded: test-deploy01: release: not found' >&2\nexit 1";
    let deployer = HelmDeployer::new(settings(&tools, helm, "exit 0"));

    deployer.destroy(&release()).unwrap();

    let calls = tools.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("helm uninstall test-deploy01 --wait"));
    assert!(calls[1].starts_with(
        "kubectl delete pvc,secret,serviceaccount --selector release=test-deploy01 --ignore-not-found"
    ));
}

#[test]
fn destroy_reports_every_cleanup_failure() {
    let tools = Tools::new();
    let helm = "echo 'Error: cluster unreachable' >&2\nexit 1";
    let kubectl = "echo 'error: forbidden' >&2\nexit 1";
    let deployer = HelmDeployer::new(settings(&tools, helm, kubectl));

    match deployer.destroy(&release()) {
        Err(DeployError::Teardown {
            message, ..
        }) => {
            assert!(message.contains("cluster unreachable"));
            assert!(message.contains("forbidden"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(tools.calls().len(), 2);
}

#[test]
fn client_setup_fails_when_port_forward_exits() {
    let tools = Tools::new();
    let kubectl = "echo 'error: unable to forward port' >&2\nexit 1";
    let deployer = HelmDeployer::new(settings(&tools, "exit 0", kubectl));

    let result = deployer.client(&release(), false);

    match result {
        Err(DeployError::ClientSetup {
            message, ..
        }) => {
            assert!(message.contains("exited early"));
            assert!(message.contains("error: unable to forward port"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("port-forward that exits must not yield a client"),
    }
    let calls = tools.calls();
    assert!(calls[0].starts_with("kubectl port-forward pod/test-deploy01-consul-server-0"));
    assert!(calls[0].contains(":8500 --address 127.0.0.1"));
}

#[test]
fn port_forward_reports_stderr_of_denied_pod() {
    let tools = Tools::new();
    let kubectl = concat!(
        "echo 'Error from server (Forbidden): pods \"test-deploy01-consul-server-0\" is ",
        "forbidden: User cannot create resource \"pods/portforward\"' >&2\nexit 1"
    );
    let deployer = HelmDeployer::new(settings(&tools, "exit 0", kubectl));

    let Err(DeployError::ClientSetup {
        release,
        message,
    }) = deployer.client(&release(), true)
    else {
        panic!("denied port-forward must fail client setup");
    };

    assert_eq!(release, "test-deploy01");
    assert!(message.contains("pods/portforward"));
    assert!(tools.calls()[0].contains(":8501 --address 127.0.0.1"));
}

// ============================================================================
// SECTION: Secrets
// ============================================================================

#[test]
fn secret_store_decodes_kubectl_output() {
    let tools = Tools::new();
    let kubectl = r#"echo '{"kind":"Secret","data":{"key":"Zm9vYmFyYmF6cXV1eA=="}}'"#;
    let store = KubectlSecretStore::new(tools.script("kubectl", kubectl), KubeTarget::new("x"));

    let data = store.get_secret("acceptance", "test-deploy01-consul-gossip-encryption-key").unwrap();

    assert_eq!(data.get("key").map(Vec::as_slice), Some("foobarbazquux".as_bytes()));
    assert!(tools.calls()[0].starts_with(
        "kubectl get secret test-deploy01-consul-gossip-encryption-key --output json --namespace acceptance"
    ));
}

#[test]
fn secret_store_maps_not_found() {
    let tools = Tools::new();
    let kubectl = r#"echo 'Error from server (NotFound): secrets "missing" not found' >&2
exit 1"#;
    let store = KubectlSecretStore::new(tools.script("kubectl", kubectl), KubeTarget::new("x"));

    assert!(matches!(
        store.get_secret("acceptance", "missing"),
        Err(SecretStoreError::NotFound { .. })
    ));
}

#[test]
fn secret_store_reports_missing_tool_as_backend_error() {
    let tools = Tools::new();
    let missing = tools.dir.path().join("no-such-kubectl").display().to_string();
    let store = KubectlSecretStore::new(missing, KubeTarget::new("x"));

    assert!(matches!(
        store.get_secret("acceptance", "any"),
        Err(SecretStoreError::Backend { .. })
    ));
}
