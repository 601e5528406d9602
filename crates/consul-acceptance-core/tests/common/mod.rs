// crates/consul-acceptance-core/tests/common/mod.rs
// ============================================================================
// Module: Acceptance Core Test Fixtures
// Description: In-memory fakes for every acceptance collaborator.
// Purpose: Drive the runner without a cluster while recording every call.
// Dependencies: consul-acceptance-core
// ============================================================================

//! ## Overview
//! Fakes share one call log so tests can assert the exact order of deployer,
//! data-plane, and secret-store calls for a case.

#![allow(dead_code, reason = "Shared fixtures are reused across multiple test binaries.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test fixtures favor direct unwrap/panic for clarity."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use consul_acceptance_core::AcceptanceEvent;
use consul_acceptance_core::AcceptanceLogSink;
use consul_acceptance_core::ClientError;
use consul_acceptance_core::ClusterDeployer;
use consul_acceptance_core::ConsulClient;
use consul_acceptance_core::DeployError;
use consul_acceptance_core::KeyringEntry;
use consul_acceptance_core::NameGenerator;
use consul_acceptance_core::OverrideMap;
use consul_acceptance_core::ReleaseName;
use consul_acceptance_core::SecretData;
use consul_acceptance_core::SecretStore;
use consul_acceptance_core::SecretStoreError;
use consul_acceptance_core::SuiteContext;
use consul_acceptance_core::SuiteSettings;

/// Gossip key used by the default fixtures.
pub const GOSSIP_KEY: &str = "Zm9vYmFyYmF6cXV1eA==";

// ============================================================================
// SECTION: Call Log
// ============================================================================

/// Collaborator call observed by the fakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String, OverrideMap),
    Client(String, bool),
    Destroy(String),
    KvPut(String),
    KvGet(String),
    KeyringList,
    GetSecret(String, String),
}

/// Shared, ordered call log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn created(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(release, _) => Some(release),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Destroy(release) => Some(release),
                _ => None,
            })
            .collect()
    }

    pub fn overrides_for(&self, release: &str) -> OverrideMap {
        self.calls()
            .into_iter()
            .find_map(|call| match call {
                Call::Create(name, overrides) if name == release => Some(overrides),
                _ => None,
            })
            .expect("release was created")
    }
}

// ============================================================================
// SECTION: Fake Consul
// ============================================================================

/// Behavior knobs for the fake data plane.
#[derive(Debug, Clone)]
pub struct ConsulBehavior {
    pub drop_writes: bool,
    pub corrupt_reads: bool,
    pub fail_puts: bool,
    pub panic_on_keyring: bool,
    pub keyring: Vec<KeyringEntry>,
}

impl Default for ConsulBehavior {
    fn default() -> Self {
        Self {
            drop_writes: false,
            corrupt_reads: false,
            fail_puts: false,
            panic_on_keyring: false,
            keyring: vec![keyring_entry(true, &[GOSSIP_KEY]), keyring_entry(false, &[GOSSIP_KEY])],
        }
    }
}

/// Builds a keyring entry for the WAN or `dc1` LAN pool.
pub fn keyring_entry(wan: bool, keys: &[&str]) -> KeyringEntry {
    KeyringEntry {
        wan,
        datacenter: if wan { String::new() } else { "dc1".to_string() },
        segment: String::new(),
        keys: keys.iter().map(|key| ((*key).to_string(), 1)).collect(),
        num_nodes: 1,
    }
}

/// In-memory KV store and keyring.
pub struct FakeConsul {
    calls: CallLog,
    store: Mutex<BTreeMap<String, Vec<u8>>>,
    behavior: ConsulBehavior,
}

impl ConsulClient for FakeConsul {
    fn kv_put(&self, key: &str, value: &[u8]) -> Result<(), ClientError> {
        self.calls.push(Call::KvPut(key.to_string()));
        if self.behavior.fail_puts {
            return Err(ClientError::Status {
                operation: "kv put",
                status: 403,
                body: "Permission denied".to_string(),
            });
        }
        if !self.behavior.drop_writes {
            self.store.lock().unwrap().insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }

    fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, ClientError> {
        self.calls.push(Call::KvGet(key.to_string()));
        let value = self.store.lock().unwrap().get(key).cloned();
        if self.behavior.corrupt_reads {
            return Ok(value.map(|mut bytes| {
                bytes.push(0xff);
                bytes
            }));
        }
        Ok(value)
    }

    fn keyring_list(&self) -> Result<Vec<KeyringEntry>, ClientError> {
        self.calls.push(Call::KeyringList);
        if self.behavior.panic_on_keyring {
            panic!("keyring endpoint exploded");
        }
        Ok(self.behavior.keyring.clone())
    }
}

// ============================================================================
// SECTION: Fake Deployer
// ============================================================================

/// Deployer that records lifecycle calls and hands out [`FakeConsul`]s.
pub struct FakeDeployer {
    pub calls: CallLog,
    pub fail_create: bool,
    pub fail_client: bool,
    pub fail_destroy: bool,
    pub consul: ConsulBehavior,
}

impl FakeDeployer {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            fail_create: false,
            fail_client: false,
            fail_destroy: false,
            consul: ConsulBehavior::default(),
        }
    }
}

impl ClusterDeployer for FakeDeployer {
    fn create(&self, release: &ReleaseName, overrides: &OverrideMap) -> Result<(), DeployError> {
        self.calls.push(Call::Create(release.to_string(), overrides.clone()));
        if self.fail_create {
            return Err(DeployError::Install {
                release: release.to_string(),
                message: "timed out waiting for pods".to_string(),
            });
        }
        Ok(())
    }

    fn client(
        &self,
        release: &ReleaseName,
        secure: bool,
    ) -> Result<Box<dyn ConsulClient>, DeployError> {
        self.calls.push(Call::Client(release.to_string(), secure));
        if self.fail_client {
            return Err(DeployError::ClientSetup {
                release: release.to_string(),
                message: "ca secret missing".to_string(),
            });
        }
        Ok(Box::new(FakeConsul {
            calls: self.calls.clone(),
            store: Mutex::new(BTreeMap::new()),
            behavior: self.consul.clone(),
        }))
    }

    fn destroy(&self, release: &ReleaseName) -> Result<(), DeployError> {
        self.calls.push(Call::Destroy(release.to_string()));
        if self.fail_destroy {
            return Err(DeployError::Teardown {
                release: release.to_string(),
                message: "uninstall hung".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Fake Secrets
// ============================================================================

/// Secret store answering every lookup with the same data.
pub struct FakeSecrets {
    pub calls: CallLog,
    pub data: Option<SecretData>,
}

impl FakeSecrets {
    pub fn with_gossip_key(calls: CallLog, key: &[u8]) -> Self {
        let mut data = SecretData::new();
        data.insert("key".to_string(), key.to_vec());
        Self {
            calls,
            data: Some(data),
        }
    }
}

impl SecretStore for FakeSecrets {
    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        self.calls.push(Call::GetSecret(namespace.to_string(), name.to_string()));
        self.data.clone().ok_or_else(|| SecretStoreError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Names
// ============================================================================

/// Deterministic `test-<n>` names.
#[derive(Default)]
pub struct SequenceNames {
    next: AtomicUsize,
}

impl NameGenerator for SequenceNames {
    fn random_name(&self) -> String {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        format!("test-{id:04}")
    }
}

/// Always returns the same name.
pub struct ConstantNames(pub &'static str);

impl NameGenerator for ConstantNames {
    fn random_name(&self) -> String {
        self.0.to_string()
    }
}

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AcceptanceEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<AcceptanceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(|event| event.kind.as_str()).collect()
    }
}

impl AcceptanceLogSink for RecordingSink {
    fn record(&self, event: &AcceptanceEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Context Builder
// ============================================================================

/// Fixture bundle for one test.
pub struct Fixture {
    pub calls: CallLog,
    pub deployer: FakeDeployer,
    pub secrets: FakeSecrets,
    pub settings: SuiteSettings,
}

impl Fixture {
    /// Healthy cluster whose secret and keyrings agree on [`GOSSIP_KEY`].
    pub fn healthy() -> Self {
        let calls = CallLog::default();
        Self {
            deployer: FakeDeployer::new(calls.clone()),
            secrets: FakeSecrets::with_gossip_key(calls.clone(), GOSSIP_KEY.as_bytes()),
            settings: SuiteSettings::default(),
            calls,
        }
    }

    /// Builds the context with sequential names and a recording sink.
    pub fn build(self) -> (SuiteContext, CallLog, Arc<RecordingSink>) {
        self.build_with_names(Arc::new(SequenceNames::default()))
    }

    /// Builds the context with a custom name generator.
    pub fn build_with_names(
        self,
        names: Arc<dyn NameGenerator>,
    ) -> (SuiteContext, CallLog, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let ctx = SuiteContext::new(
            self.settings,
            Arc::new(self.deployer),
            Arc::new(self.secrets),
            names,
        )
        .with_log_sink(sink.clone());
        (ctx, self.calls, sink)
    }
}
