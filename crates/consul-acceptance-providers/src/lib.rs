// crates/consul-acceptance-providers/src/lib.rs
// ============================================================================
// Module: Consul Acceptance Providers
// Description: Helm, kubectl, and Consul HTTP adapters for the acceptance core.
// Purpose: Run the acceptance matrix against a real Kubernetes cluster.
// Dependencies: consul-acceptance-core, reqwest, serde_json, base64, rand
// ============================================================================

//! ## Overview
//! Concrete implementations of the acceptance collaborator traits:
//! [`HelmDeployer`] for cluster lifecycle, [`KubectlSecretStore`] for release
//! secrets, [`ConsulHttpClient`] for the data plane, and [`RandomNames`] for
//! release names and KV keys.
//! Invariants:
//! - External tools are invoked without a shell; arguments are never joined.
//! - Port-forward tunnels live exactly as long as the client using them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod consul;
pub mod helm;
pub mod kube;
pub mod names;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consul::ConsulClientConfig;
pub use consul::ConsulHttpClient;
pub use helm::HelmDeployer;
pub use helm::HelmSettings;
pub use kube::CommandError;
pub use kube::KubeTarget;
pub use kube::KubectlSecretStore;
pub use kube::PortForward;
pub use names::RandomNames;
