// crates/consul-acceptance-core/src/runtime/runner.rs
// ============================================================================
// Module: Matrix Runner
// Description: Sequential execution of configuration cases.
// Purpose: Run each case in isolation and collect attributable outcomes.
// Dependencies: crate::{core, logging, runtime}
// ============================================================================

//! ## Overview
//! Cases run one after another. Within a case the order is strict: allocate
//! release, install, build client, KV round-trip, keyring check (secure only),
//! teardown. A failure or panic ends only the current case; the next case
//! still runs with its own release.
//!
//! Invariants:
//! - Release names are pairwise distinct within one [`run_matrix`] call.
//! - Every case that allocated a release attempts teardown exactly once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeSet;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;

use crate::core::ConfigurationCase;
use crate::core::ReleaseName;
use crate::interfaces::NameGenerator;
use crate::logging::AcceptanceEvent;
use crate::logging::EventKind;
use crate::runtime::context::CaseScope;
use crate::runtime::context::SuiteContext;
use crate::runtime::error::CaseError;
use crate::runtime::handle::ClusterHandle;
use crate::runtime::verify::GossipKeyReport;
use crate::runtime::verify::verify_gossip_keyring;
use crate::runtime::verify::verify_kv_roundtrip;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Attempts to draw a unique, valid release name before giving up.
pub const MAX_RELEASE_NAME_ATTEMPTS: usize = 8;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Evidence collected by a passing case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// Key written and read back.
    pub kv_key: String,
    /// Length of the value written.
    pub kv_value_len: usize,
    /// Keyring check result; `None` for insecure cases.
    pub keyring: Option<GossipKeyReport>,
}

/// Result of one configuration case.
#[derive(Debug)]
pub struct CaseOutcome {
    /// Case that ran.
    pub case: ConfigurationCase,
    /// Case label.
    pub label: String,
    /// Release allocated to the case, if allocation succeeded.
    pub release: Option<ReleaseName>,
    /// Wall-clock duration of the case.
    pub duration: Duration,
    /// Report on success, first error on failure.
    pub result: Result<CaseReport, CaseError>,
}

impl CaseOutcome {
    /// Returns true when the case passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a full matrix run, in case order.
#[derive(Debug, Default)]
pub struct MatrixReport {
    /// Per-case outcomes.
    pub outcomes: Vec<CaseOutcome>,
}

impl MatrixReport {
    /// Returns true when every case passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }

    /// Iterates failed cases.
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed())
    }

    /// One line per failed case: `<label> [<category>]: <error>`.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        self.failures()
            .filter_map(|outcome| {
                outcome.result.as_ref().err().map(|err| {
                    format!("{} [{}]: {err}", outcome.label, err.category())
                })
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs every case in order and returns their outcomes.
#[must_use]
pub fn run_matrix(ctx: &SuiteContext, cases: &[ConfigurationCase]) -> MatrixReport {
    let mut used = BTreeSet::new();
    let outcomes = cases.iter().map(|case| execute_case(ctx, *case, &mut used)).collect();
    MatrixReport {
        outcomes,
    }
}

/// Runs a single case with a freshly allocated release.
#[must_use]
pub fn run_case(ctx: &SuiteContext, case: ConfigurationCase) -> CaseOutcome {
    let mut used = BTreeSet::new();
    execute_case(ctx, case, &mut used)
}

/// Allocates a release, runs the case body behind a panic boundary, and
/// records the outcome.
fn execute_case(
    ctx: &SuiteContext,
    case: ConfigurationCase,
    used: &mut BTreeSet<ReleaseName>,
) -> CaseOutcome {
    let label = case.label();
    let started = Instant::now();

    let release = match allocate_release_name(ctx.names(), used) {
        Ok(release) => release,
        Err(err) => {
            let error = CaseError::ReleaseName(err);
            let event =
                AcceptanceEvent::new(EventKind::CaseFailed, error.to_string()).with_case(&label);
            ctx.log().record(&event);
            return CaseOutcome {
                case,
                label,
                release: None,
                duration: started.elapsed(),
                result: Err(error),
            };
        }
    };

    let scope = CaseScope::new(label.clone(), release.clone());
    scope.emit(ctx, EventKind::CaseStarted, "case started");

    let result = panic::catch_unwind(AssertUnwindSafe(|| case_body(ctx, &scope, case)))
        .unwrap_or_else(|payload| Err(CaseError::Panicked(panic_message(payload.as_ref()))));

    match &result {
        Ok(_) => scope.emit(ctx, EventKind::CasePassed, "case passed"),
        Err(err) => scope.emit(ctx, EventKind::CaseFailed, format!("[{}] {err}", err.category())),
    }

    CaseOutcome {
        case,
        label,
        release: Some(release),
        duration: started.elapsed(),
        result,
    }
}

/// Installs the release and runs the verifiers; tears down on every path.
fn case_body(
    ctx: &SuiteContext,
    scope: &CaseScope,
    case: ConfigurationCase,
) -> Result<CaseReport, CaseError> {
    let mut cluster = ClusterHandle::create(ctx, scope, &case.overrides())?;
    let verified = verify_release(ctx, scope, &cluster, case);
    match verified {
        Ok(report) => {
            cluster.teardown()?;
            Ok(report)
        }
        Err(err) => {
            cluster.mark_failed();
            Err(err)
        }
    }
}

/// Runs the functional check and, for secure cases, the keyring check.
fn verify_release(
    ctx: &SuiteContext,
    scope: &CaseScope,
    cluster: &ClusterHandle<'_>,
    case: ConfigurationCase,
) -> Result<CaseReport, CaseError> {
    let client = cluster.setup_client(case.secure)?;
    let pair = verify_kv_roundtrip(ctx, scope, client.as_ref())?;
    let keyring =
        if case.secure { Some(verify_gossip_keyring(ctx, scope, client.as_ref())?) } else { None };
    Ok(CaseReport {
        kv_key: pair.key,
        kv_value_len: pair.value.len(),
        keyring,
    })
}

/// Draws names until one is a valid release name not yet used in this run.
fn allocate_release_name(
    names: &dyn NameGenerator,
    used: &mut BTreeSet<ReleaseName>,
) -> Result<ReleaseName, String> {
    let mut last_error = String::new();
    for _ in 0 .. MAX_RELEASE_NAME_ATTEMPTS {
        match ReleaseName::new(names.random_name()) {
            Ok(release) if used.insert(release.clone()) => return Ok(release),
            Ok(release) => last_error = format!("{release} already used in this run"),
            Err(err) => last_error = err.to_string(),
        }
    }
    Err(format!("no usable name after {MAX_RELEASE_NAME_ATTEMPTS} attempts: {last_error}"))
}

/// Extracts the message of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}
