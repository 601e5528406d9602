// system-tests/tests/suites/basic.rs
// ============================================================================
// Module: Basic Installation Tests
// Description: Security-matrix install, KV round-trip, and keyring checks.
// Purpose: Prove a fresh Consul release works under each security posture.
// Dependencies: system-tests, consul-acceptance-core, helpers
// ============================================================================

//! ## Overview
//! Installs one release per entry of the security matrix, writes and reads a
//! KV entry, and for secure releases checks that every keyring carries the
//! auto-generated gossip key. Summaries land under the run root.

use consul_acceptance_core::SECURITY_MATRIX;
use consul_acceptance_core::run_matrix;
use system_tests::config::SystemTestConfig;
use system_tests::harness;

use crate::helpers::artifacts::TestReporter;

#[test]
fn basic_installation_matrix() -> Result<(), Box<dyn std::error::Error>> {
    let config = SystemTestConfig::load()?;
    let root = harness::run_root(&config);
    let mut reporter = TestReporter::new(&root, "basic_installation_matrix")?;
    let log = harness::event_log(&root)?;
    let ctx = harness::suite_context(&config, log);

    let report = run_matrix(&ctx, &SECURITY_MATRIX);

    let mut notes = Vec::with_capacity(report.outcomes.len());
    let mut artifacts = vec![harness::EVENT_LOG_FILE.to_string()];
    for (index, outcome) in report.outcomes.iter().enumerate() {
        let path = reporter.artifacts().write_case_summary(index, outcome)?;
        if let Ok(relative) = path.strip_prefix(reporter.artifacts().root()) {
            artifacts.push(relative.display().to_string());
        }
        let status = outcome.result.as_ref().map_or_else(|err| err.category(), |_| "passed");
        let release = outcome.release.as_ref().map_or("-", |release| release.as_str());
        notes.push(format!("{} ({release}): {status}", outcome.label));
    }

    let status = if report.all_passed() { "pass" } else { "fail" };
    reporter.finish(status, notes, artifacts)?;

    if !report.all_passed() {
        return Err(format!("acceptance cases failed:\n{}", report.failure_summary()).into());
    }
    Ok(())
}
