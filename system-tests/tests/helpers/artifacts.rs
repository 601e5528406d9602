// system-tests/tests/helpers/artifacts.rs
// ============================================================================
// Module: Test Artifacts
// Description: Artifact helpers for the acceptance run.
// Purpose: Create per-run and per-case roots and write deterministic summaries.
// Dependencies: consul-acceptance-core, serde, serde_jcs
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use consul_acceptance_core::CaseOutcome;
use consul_acceptance_core::CaseReport;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TestSummary {
    test_name: String,
    status: String,
    started_at_ms: u128,
    ended_at_ms: u128,
    duration_ms: u128,
    notes: Vec<String>,
    artifacts: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CaseSummary<'a> {
    case: &'a str,
    secure: bool,
    auto_encrypt: bool,
    release: Option<&'a str>,
    status: &'static str,
    duration_ms: u128,
    error: Option<String>,
    report: Option<&'a CaseReport>,
}

fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Directory-safe name for a case label.
fn case_dir_name(index: usize, outcome: &CaseOutcome) -> String {
    format!(
        "case_{index}_secure-{}_auto-encrypt-{}",
        outcome.case.secure, outcome.case.auto_encrypt
    )
}

/// Artifact manager rooted at one directory.
#[derive(Debug, Clone)]
pub struct TestArtifacts {
    root: PathBuf,
}

impl TestArtifacts {
    /// Creates (if needed) and wraps `root`.
    pub fn new(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the root directory for the artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns a child artifact manager.
    pub fn child(&self, name: &str) -> io::Result<Self> {
        Self::new(&self.root.join(name))
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        let bytes = serde_jcs::to_vec(value).map_err(|err| io::Error::other(err.to_string()))?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes a text artifact with UTF-8 encoding.
    pub fn write_text(&self, name: &str, value: &str) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, value.as_bytes())?;
        Ok(path)
    }

    /// Writes `summary.json` for one case outcome into its own directory.
    pub fn write_case_summary(&self, index: usize, outcome: &CaseOutcome) -> io::Result<PathBuf> {
        let dir = self.child(&case_dir_name(index, outcome))?;
        let (status, error, report) = match &outcome.result {
            Ok(report) => ("passed", None, Some(report)),
            Err(err) => (err.category(), Some(err.to_string()), None),
        };
        let summary = CaseSummary {
            case: &outcome.label,
            secure: outcome.case.secure,
            auto_encrypt: outcome.case.auto_encrypt,
            release: outcome.release.as_ref().map(|release| release.as_str()),
            status,
            duration_ms: outcome.duration.as_millis(),
            error,
            report,
        };
        dir.write_text("summary.md", &case_markdown(&summary))?;
        dir.write_json("summary.json", &summary)
    }
}

/// Helper that writes summaries even when a test panics.
pub struct TestReporter {
    artifacts: TestArtifacts,
    test_name: String,
    started_at_ms: u128,
    finalized: bool,
}

impl TestReporter {
    /// Creates a reporter writing into `root`.
    pub fn new(root: &Path, test_name: &str) -> io::Result<Self> {
        Ok(Self {
            artifacts: TestArtifacts::new(root)?,
            test_name: test_name.to_string(),
            started_at_ms: now_millis(),
            finalized: false,
        })
    }

    /// Returns the artifact manager.
    pub fn artifacts(&self) -> &TestArtifacts {
        &self.artifacts
    }

    /// Writes the final summary for the test.
    pub fn finish(
        &mut self,
        status: &str,
        notes: Vec<String>,
        artifacts: Vec<String>,
    ) -> io::Result<()> {
        let ended_at_ms = now_millis();
        let summary = TestSummary {
            test_name: self.test_name.clone(),
            status: status.to_string(),
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            duration_ms: ended_at_ms.saturating_sub(self.started_at_ms),
            notes,
            artifacts,
        };
        self.artifacts.write_json("summary.json", &summary)?;
        self.artifacts.write_text("summary.md", &summary_markdown(&summary))?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status = if std::thread::panicking() { "panic" } else { "unknown" };
        let _ = self.finish(
            status,
            vec!["test terminated without explicit summary".to_string()],
            Vec::new(),
        );
    }
}

fn summary_markdown(summary: &TestSummary) -> String {
    let mut out = String::new();
    out.push_str("# Acceptance Summary\n\n");
    out.push_str("## Status\n\n");
    out.push_str(&format!("- Test: {}\n", summary.test_name));
    out.push_str(&format!("- Status: {}\n", summary.status));
    out.push_str(&format!("- Duration (ms): {}\n", summary.duration_ms));
    out.push_str("\n## Cases\n\n");
    if summary.notes.is_empty() {
        out.push_str("- None\n");
    } else {
        for note in &summary.notes {
            out.push_str(&format!("- {note}\n"));
        }
    }
    out.push_str("\n## Artifacts\n\n");
    if summary.artifacts.is_empty() {
        out.push_str("- None\n");
    } else {
        for artifact in &summary.artifacts {
            out.push_str(&format!("- {artifact}\n"));
        }
    }
    out
}

fn case_markdown(summary: &CaseSummary<'_>) -> String {
    let mut out = String::new();
    out.push_str("# Case Summary\n\n");
    out.push_str(&format!("- Case: {}\n", summary.case));
    out.push_str(&format!("- Release: {}\n", summary.release.unwrap_or("-")));
    out.push_str(&format!("- Status: {}\n", summary.status));
    out.push_str(&format!("- Duration (ms): {}\n", summary.duration_ms));
    if let Some(error) = &summary.error {
        out.push_str(&format!("- Error: {error}\n"));
    }
    if let Some(keyring) = summary.report.and_then(|report| report.keyring.as_ref()) {
        out.push_str(&format!("- Keyrings: {}\n", keyring.pools.join(", ")));
    }
    out
}
