// crates/consul-acceptance-providers/src/kube.rs
// ============================================================================
// Module: Kubernetes Access
// Description: kubectl invocation, secret reads, and port-forward tunnels.
// Purpose: Reach a release's secrets and server pod from the test host.
// Dependencies: consul-acceptance-core, serde_json, base64, thiserror
// ============================================================================

//! ## Overview
//! Everything here shells out to `kubectl` with the cluster selected by a
//! [`KubeTarget`]. Secrets are read as JSON and their base64 fields decoded.
//! A [`PortForward`] owns its `kubectl port-forward` child and kills it on
//! drop, so a tunnel never outlives the client that uses it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::BufRead;
use std::io::BufReader;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::Child;
use std::process::ChildStderr;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use consul_acceptance_core::SecretData;
use consul_acceptance_core::SecretStore;
use consul_acceptance_core::SecretStoreError;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Target
// ============================================================================

/// Cluster and namespace every command is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeTarget {
    /// Explicit kubeconfig; the tool default when unset.
    pub kubeconfig: Option<PathBuf>,
    /// Explicit context; the current context when unset.
    pub context: Option<String>,
    /// Namespace for installs, secrets, and pods.
    pub namespace: String,
}

impl KubeTarget {
    /// Targets `namespace` in the default kubeconfig and context.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            kubeconfig: None,
            context: None,
            namespace: namespace.into(),
        }
    }

    /// Cluster selection flags for `kubectl`.
    #[must_use]
    pub fn kubectl_args(&self) -> Vec<String> {
        self.cluster_args("--context")
    }

    /// Cluster selection flags for `helm`.
    #[must_use]
    pub fn helm_args(&self) -> Vec<String> {
        self.cluster_args("--kube-context")
    }

    /// `--namespace` plus kubeconfig and context flags.
    fn cluster_args(&self, context_flag: &str) -> Vec<String> {
        let mut args = vec!["--namespace".to_string(), self.namespace.clone()];
        if let Some(context) = &self.context {
            args.push(context_flag.to_string());
            args.push(context.clone());
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.display().to_string());
        }
        args
    }
}

// ============================================================================
// SECTION: Command Runner
// ============================================================================

/// External tool invocation errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The tool could not be started.
    #[error("failed to run {program}: {message}")]
    Spawn {
        /// Program name.
        program: String,
        /// OS error detail.
        message: String,
    },
    /// The tool exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program name.
        program: String,
        /// Exit status description.
        status: String,
        /// Trimmed stderr.
        stderr: String,
    },
}

impl CommandError {
    /// Returns true when the tool reported a missing object.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Failed {
                stderr, ..
            } => {
                let lowered = stderr.to_ascii_lowercase();
                lowered.contains("not found") || lowered.contains("notfound")
            }
            Self::Spawn {
                ..
            } => false,
        }
    }
}

/// Runs `program` with `args` and returns its stdout.
///
/// # Errors
///
/// Returns [`CommandError`] when the program cannot be started or exits
/// unsuccessfully.
pub fn run_tool(program: &str, args: &[String]) -> Result<Vec<u8>, CommandError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| CommandError::Spawn {
            program: program.to_string(),
            message: err.to_string(),
        })?;
    if output.status.success() {
        return Ok(output.stdout);
    }
    Err(CommandError::Failed {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

// ============================================================================
// SECTION: Secret Store
// ============================================================================

/// Secret store backed by `kubectl get secret -o json`.
#[derive(Debug, Clone)]
pub struct KubectlSecretStore {
    /// kubectl program.
    kubectl: String,
    /// Cluster selection; its namespace is replaced per lookup.
    target: KubeTarget,
}

impl KubectlSecretStore {
    /// Creates a store using `kubectl` against `target`'s cluster.
    #[must_use]
    pub fn new(kubectl: impl Into<String>, target: KubeTarget) -> Self {
        Self {
            kubectl: kubectl.into(),
            target,
        }
    }

    /// Builds the `kubectl get secret` arguments for a lookup.
    #[must_use]
    pub fn get_secret_args(&self, namespace: &str, name: &str) -> Vec<String> {
        let target = KubeTarget {
            namespace: namespace.to_string(),
            ..self.target.clone()
        };
        let mut args = vec!["get".to_string(), "secret".to_string(), name.to_string()];
        args.extend(["--output".to_string(), "json".to_string()]);
        args.extend(target.kubectl_args());
        args
    }
}

impl SecretStore for KubectlSecretStore {
    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        let stdout =
            run_tool(&self.kubectl, &self.get_secret_args(namespace, name)).map_err(|err| {
                if err.is_not_found() {
                    SecretStoreError::NotFound {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    }
                } else {
                    SecretStoreError::Backend {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                        message: err.to_string(),
                    }
                }
            })?;
        parse_secret_json(&stdout).map_err(|message| SecretStoreError::Backend {
            namespace: namespace.to_string(),
            name: name.to_string(),
            message,
        })
    }
}

/// Secret object as printed by `kubectl get secret -o json`.
#[derive(Deserialize)]
struct SecretWire {
    /// Base64-encoded field values.
    #[serde(default)]
    data: Option<BTreeMap<String, String>>,
}

/// Decodes the `data` fields of a secret JSON document.
///
/// # Errors
///
/// Returns a message when the document is not JSON or a field is not base64.
pub fn parse_secret_json(raw: &[u8]) -> Result<SecretData, String> {
    let secret: SecretWire =
        serde_json::from_slice(raw).map_err(|err| format!("invalid secret json: {err}"))?;
    secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(field, encoded)| match STANDARD.decode(encoded.as_bytes()) {
            Ok(value) => Ok((field, value)),
            Err(err) => Err(format!("secret field {field} is not base64: {err}")),
        })
        .collect()
}

// ============================================================================
// SECTION: Port Forward
// ============================================================================

/// Delay between readiness checks.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bytes of port-forward stderr kept for diagnostics.
const STDERR_TAIL_BYTES: usize = 4096;

/// Running `kubectl port-forward` to one pod port.
pub struct PortForward {
    /// kubectl child process.
    child: Child,
    /// Loopback address forwarding to the pod.
    local: SocketAddr,
    /// Most recent stderr output of the child.
    stderr_tail: Arc<Mutex<String>>,
    /// Thread draining the child's stderr pipe.
    stderr_reader: Option<JoinHandle<()>>,
}

impl PortForward {
    /// Starts forwarding a free loopback port to `pod`'s `remote_port` and
    /// waits until the local port accepts connections.
    ///
    /// # Errors
    ///
    /// Returns a message when no port is free, kubectl cannot start, kubectl
    /// exits early, or the port is not accepting within `timeout`.
    pub fn start(
        kubectl: &str,
        target: &KubeTarget,
        pod: &str,
        remote_port: u16,
        timeout: Duration,
    ) -> Result<Self, String> {
        let local_port = free_local_port()?;
        let args = port_forward_args(target, pod, local_port, remote_port);
        let mut child = Command::new(kubectl)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| format!("failed to start port-forward: {err}"))?;
        let stderr_tail = Arc::new(Mutex::new(String::new()));
        let stderr_reader =
            child.stderr.take().map(|stderr| drain_stderr(stderr, Arc::clone(&stderr_tail)));
        let mut forward = Self {
            child,
            local: SocketAddr::from((Ipv4Addr::LOCALHOST, local_port)),
            stderr_tail,
            stderr_reader,
        };
        forward.wait_ready(timeout)?;
        Ok(forward)
    }

    /// Local address forwarding to the pod.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Polls the local port until it accepts or the deadline passes.
    fn wait_ready(&mut self, timeout: Duration) -> Result<(), String> {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            if let Ok(Some(status)) = self.child.try_wait() {
                if let Some(reader) = self.stderr_reader.take() {
                    let _ = reader.join();
                }
                return Err(with_stderr(
                    format!("port-forward exited early with {status}"),
                    &self.stderr(),
                ));
            }
            if TcpStream::connect_timeout(&self.local, READY_POLL_INTERVAL).is_ok() {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(with_stderr(
                    format!("port-forward to {} not ready after {attempts} attempts", self.local),
                    &self.stderr(),
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Stderr captured so far, trimmed.
    fn stderr(&self) -> String {
        self.stderr_tail.lock().map(|tail| tail.trim().to_string()).unwrap_or_default()
    }
}

impl Drop for PortForward {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(reader) = self.stderr_reader.take() {
            let _ = reader.join();
        }
    }
}

/// Appends captured stderr to a failure message when there is any.
fn with_stderr(message: String, stderr: &str) -> String {
    if stderr.is_empty() { message } else { format!("{message}: {stderr}") }
}

/// Copies `stderr` into `tail` line by line, keeping the last
/// [`STDERR_TAIL_BYTES`] bytes.
fn drain_stderr(stderr: ChildStderr, tail: Arc<Mutex<String>>) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            let Ok(line) = line else {
                break;
            };
            let Ok(mut tail) = tail.lock() else {
                break;
            };
            tail.push_str(&line);
            tail.push('\n');
            let excess = tail.len().saturating_sub(STDERR_TAIL_BYTES);
            if excess > 0 {
                let cut =
                    (excess ..= tail.len()).find(|&at| tail.is_char_boundary(at)).unwrap_or(excess);
                tail.drain(.. cut);
            }
        }
    })
}

/// Builds the `kubectl port-forward` arguments.
#[must_use]
pub fn port_forward_args(
    target: &KubeTarget,
    pod: &str,
    local_port: u16,
    remote_port: u16,
) -> Vec<String> {
    let mut args = vec![
        "port-forward".to_string(),
        format!("pod/{pod}"),
        format!("{local_port}:{remote_port}"),
        "--address".to_string(),
        "127.0.0.1".to_string(),
    ];
    args.extend(target.kubectl_args());
    args
}

/// Reserves and releases an ephemeral loopback port.
fn free_local_port() -> Result<u16, String> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|err| format!("no free local port: {err}"))?;
    listener.local_addr().map(|addr| addr.port()).map_err(|err| format!("no free local port: {err}"))
}
