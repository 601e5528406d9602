// system-tests/src/harness.rs
// ============================================================================
// Module: Acceptance Harness
// Description: Provider wiring for a live acceptance run.
// Purpose: Build the helm deployer, secret store, and log sinks from config.
// Dependencies: consul-acceptance-core, consul-acceptance-providers
// ============================================================================

//! ## Overview
//! [`suite_context`] assembles a [`SuiteContext`] backed by `helm` and
//! `kubectl` against the configured cluster. Events go to stderr and to an
//! `events.jsonl` file under the run root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use consul_acceptance_core::AcceptanceLogSink;
use consul_acceptance_core::FanoutLogSink;
use consul_acceptance_core::FileLogSink;
use consul_acceptance_core::StderrLogSink;
use consul_acceptance_core::SuiteContext;
use consul_acceptance_providers::HelmDeployer;
use consul_acceptance_providers::HelmSettings;
use consul_acceptance_providers::KubeTarget;
use consul_acceptance_providers::KubectlSecretStore;
use consul_acceptance_providers::RandomNames;

use crate::config::SystemTestConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Directory holding per-run artifact roots when no override is set.
pub const DEFAULT_ARTIFACT_DIR: &str = "target/acceptance";

/// Event log file name inside the run root.
pub const EVENT_LOG_FILE: &str = "events.jsonl";

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Cluster selection for the configured environment.
#[must_use]
pub fn kube_target(config: &SystemTestConfig) -> KubeTarget {
    KubeTarget {
        kubeconfig: config.kubeconfig.clone(),
        context: config.kube_context.clone(),
        namespace: config.namespace.clone(),
    }
}

/// Helm deployer settings for the configured environment.
#[must_use]
pub fn helm_settings(config: &SystemTestConfig) -> HelmSettings {
    let mut settings = HelmSettings::new(config.helm_chart.clone(), kube_target(config));
    settings.install_timeout = config.install_timeout;
    settings.request_timeout = config.request_timeout;
    settings
}

/// Run root for this invocation: the override, else a timestamped directory.
#[must_use]
pub fn run_root(config: &SystemTestConfig) -> PathBuf {
    config.run_root.clone().unwrap_or_else(|| {
        let stamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        PathBuf::from(DEFAULT_ARTIFACT_DIR).join(format!("run_{stamp}"))
    })
}

/// Stderr plus append-only `events.jsonl` under `root`.
///
/// # Errors
///
/// Returns an error when the run root or the event log cannot be created.
pub fn event_log(root: &Path) -> io::Result<Arc<dyn AcceptanceLogSink>> {
    std::fs::create_dir_all(root)?;
    let file = FileLogSink::new(&root.join(EVENT_LOG_FILE))?;
    Ok(Arc::new(FanoutLogSink::new(vec![Box::new(StderrLogSink), Box::new(file)])))
}

/// Builds the live suite context.
#[must_use]
pub fn suite_context(config: &SystemTestConfig, log: Arc<dyn AcceptanceLogSink>) -> SuiteContext {
    let settings = helm_settings(config);
    let secrets = KubectlSecretStore::new(settings.kubectl.clone(), settings.target.clone());
    SuiteContext::new(
        config.suite_settings(),
        Arc::new(HelmDeployer::new(settings)),
        Arc::new(secrets),
        Arc::new(RandomNames),
    )
    .with_log_sink(log)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
