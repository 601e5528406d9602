// crates/consul-acceptance-core/src/runtime/context.rs
// ============================================================================
// Module: Suite Context
// Description: Per-run settings and collaborator handles.
// Purpose: Pass the test environment explicitly instead of through globals.
// Dependencies: crate::{core, interfaces, logging}
// ============================================================================

//! ## Overview
//! A [`SuiteContext`] is built once per run and borrowed by every case,
//! cluster handle, and verifier. A [`CaseScope`] names the case currently
//! executing so events and errors stay attributable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::OverrideMap;
use crate::core::ReleaseName;
use crate::interfaces::ClusterDeployer;
use crate::interfaces::NameGenerator;
use crate::interfaces::SecretStore;
use crate::logging::AcceptanceEvent;
use crate::logging::AcceptanceLogSink;
use crate::logging::EventKind;
use crate::logging::NoopLogSink;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Default number of keyring entries a single-datacenter install reports.
pub const DEFAULT_KEYRING_ENTRIES: usize = 2;

/// Run-wide settings shared by every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSettings {
    /// Namespace the releases and their secrets live in.
    pub namespace: String,
    /// Keyring entries every secure install must report.
    pub expected_keyring_entries: usize,
    /// Leave failed releases installed for debugging.
    pub no_cleanup_on_failure: bool,
    /// Environment-derived overrides applied beneath each case's overrides.
    pub base_overrides: OverrideMap,
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            expected_keyring_entries: DEFAULT_KEYRING_ENTRIES,
            no_cleanup_on_failure: false,
            base_overrides: OverrideMap::new(),
        }
    }
}

// ============================================================================
// SECTION: Suite Context
// ============================================================================

/// Settings and collaborators for one acceptance run.
pub struct SuiteContext {
    /// Run-wide settings.
    settings: SuiteSettings,
    /// Installs and removes releases.
    deployer: Arc<dyn ClusterDeployer>,
    /// Reads release secrets.
    secrets: Arc<dyn SecretStore>,
    /// Produces release names and KV payloads.
    names: Arc<dyn NameGenerator>,
    /// Receives progress events.
    log: Arc<dyn AcceptanceLogSink>,
}

impl SuiteContext {
    /// Creates a context that discards progress events.
    #[must_use]
    pub fn new(
        settings: SuiteSettings,
        deployer: Arc<dyn ClusterDeployer>,
        secrets: Arc<dyn SecretStore>,
        names: Arc<dyn NameGenerator>,
    ) -> Self {
        Self {
            settings,
            deployer,
            secrets,
            names,
            log: Arc::new(NoopLogSink),
        }
    }

    /// Routes progress events to `log`.
    #[must_use]
    pub fn with_log_sink(mut self, log: Arc<dyn AcceptanceLogSink>) -> Self {
        self.log = log;
        self
    }

    /// Returns the run-wide settings.
    #[must_use]
    pub const fn settings(&self) -> &SuiteSettings {
        &self.settings
    }

    /// Returns the deployment mechanism.
    #[must_use]
    pub fn deployer(&self) -> &dyn ClusterDeployer {
        self.deployer.as_ref()
    }

    /// Returns the secret store.
    #[must_use]
    pub fn secrets(&self) -> &dyn SecretStore {
        self.secrets.as_ref()
    }

    /// Returns the name generator.
    #[must_use]
    pub fn names(&self) -> &dyn NameGenerator {
        self.names.as_ref()
    }

    /// Returns the log sink.
    #[must_use]
    pub fn log(&self) -> &dyn AcceptanceLogSink {
        self.log.as_ref()
    }
}

// ============================================================================
// SECTION: Case Scope
// ============================================================================

/// Label and release of the case currently executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseScope {
    /// Case label used in reports.
    pub label: String,
    /// Release allocated to the case.
    pub release: ReleaseName,
}

impl CaseScope {
    /// Creates a scope.
    #[must_use]
    pub fn new(label: impl Into<String>, release: ReleaseName) -> Self {
        Self {
            label: label.into(),
            release,
        }
    }

    /// Builds an event tagged with this case and release.
    #[must_use]
    pub fn event(&self, kind: EventKind, message: impl Into<String>) -> AcceptanceEvent {
        AcceptanceEvent::new(kind, message).with_case(&self.label).with_release(&self.release)
    }

    /// Records an event tagged with this case on `ctx`'s sink.
    pub fn emit(&self, ctx: &SuiteContext, kind: EventKind, message: impl Into<String>) {
        ctx.log().record(&self.event(kind, message));
    }
}
