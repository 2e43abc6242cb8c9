use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    ConstructionError, DependencyCheckResult, DependencyGate, EventSink, ModelBinding,
    ModelDescriptor, ModuleEntry, ModuleRegistry, RegistryError, RemoteError, RemoteRecord,
    RemoteSource, SessionHandle, SetupEvent, SyncExecutor, SyncOutcome, SyncStats,
};

/// Sink that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SetupEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SetupEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Percentages of the recorded progress events, in order.
    pub fn percents(&self) -> Vec<u32> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                SetupEvent::Progress(p) => Some(p.percent()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SetupEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Executor that records calls and answers from a per-model script.
///
/// Unscripted models are constructed through their descriptor and report
/// empty stats.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<String>>,
    outcomes: HashMap<String, SyncOutcome>,
    broken: HashSet<String>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(mut self, model: impl Into<String>, outcome: SyncOutcome) -> Self {
        self.outcomes.insert(model.into(), outcome);
        self
    }

    /// Construction of `model` fails with `MissingFactory`.
    pub fn with_broken(mut self, model: impl Into<String>) -> Self {
        self.broken.insert(model.into());
        self
    }

    /// Model names passed to `synchronize`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SyncExecutor for ScriptedExecutor {
    async fn synchronize(
        &self,
        descriptor: &ModelDescriptor,
        session: &SessionHandle,
    ) -> Result<SyncOutcome, ConstructionError> {
        self.calls.lock().unwrap().push(descriptor.name().to_owned());

        if self.broken.contains(descriptor.name()) {
            return Err(ConstructionError::MissingFactory(descriptor.name().to_owned()));
        }
        descriptor.construct(session)?;

        Ok(self
            .outcomes
            .get(descriptor.name())
            .cloned()
            .unwrap_or(SyncOutcome::Synced(SyncStats::default())))
    }
}

/// Gate with a fixed answer that counts how often it is consulted.
#[derive(Debug)]
pub struct StaticGate {
    result: DependencyCheckResult,
    calls: AtomicUsize,
}

impl StaticGate {
    pub fn new(result: DependencyCheckResult) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn satisfied() -> Self {
        Self::new(DependencyCheckResult::Satisfied)
    }

    pub fn missing(names: &[&str]) -> Self {
        Self::new(DependencyCheckResult::Unsatisfied(
            names.iter().map(|n| (*n).to_owned()).collect(),
        ))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DependencyGate for StaticGate {
    async fn check(&self, _session: &SessionHandle) -> DependencyCheckResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Module registry with fixed entries, or a fixed read error.
#[derive(Debug)]
pub struct StaticRegistry {
    entries: Result<Vec<ModuleEntry>, String>,
}

impl StaticRegistry {
    pub fn new(entries: Vec<ModuleEntry>) -> Self {
        Self {
            entries: Ok(entries),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            entries: Err(message.into()),
        }
    }
}

#[async_trait::async_trait]
impl ModuleRegistry for StaticRegistry {
    async fn modules(&self, _session: &SessionHandle) -> Result<Vec<ModuleEntry>, RegistryError> {
        self.entries
            .clone()
            .map_err(RegistryError::Storage)
    }
}

/// In-memory remote keyed by model name.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    label: String,
    records: Mutex<HashMap<String, Vec<RemoteRecord>>>,
    unreachable: HashSet<String>,
}

impl InMemoryRemote {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Replace the records served for `model`.
    pub fn set(&self, model: impl Into<String>, records: Vec<serde_json::Value>) {
        let records = records
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::Object(map) => Some(RemoteRecord::new(map)),
                _ => None,
            })
            .collect();
        self.records.lock().unwrap().insert(model.into(), records);
    }

    /// Fetches for `model` fail with a network error.
    pub fn with_unreachable(mut self, model: impl Into<String>) -> Self {
        self.unreachable.insert(model.into());
        self
    }
}

#[async_trait::async_trait]
impl RemoteSource for InMemoryRemote {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch_records(
        &self,
        binding: &ModelBinding,
    ) -> Result<Vec<RemoteRecord>, RemoteError> {
        if self.unreachable.contains(&binding.model) {
            return Err(RemoteError::Network(format!("{} unreachable", binding.model)));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&binding.model)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn session() -> SessionHandle {
        SessionHandle::new("admin", "prod").unwrap()
    }

    #[tokio::test]
    async fn scripted_executor_records_calls_and_outcomes() {
        let executor = ScriptedExecutor::new()
            .with_outcome("b", SyncOutcome::failed("boom"))
            .with_broken("c");

        let a = executor
            .synchronize(&ModelDescriptor::new("a"), &session())
            .await
            .unwrap();
        let b = executor
            .synchronize(&ModelDescriptor::new("b"), &session())
            .await
            .unwrap();
        let c = executor
            .synchronize(&ModelDescriptor::new("c"), &session())
            .await;

        assert_eq!(a, SyncOutcome::Synced(SyncStats::default()));
        assert!(b.is_failed());
        assert!(c.is_err());
        assert_eq!(executor.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn in_memory_remote_serves_objects_only() {
        let remote = InMemoryRemote::new("mem").with_unreachable("down");
        remote.set("res.partner", vec![json!({"id": 1}), json!("junk")]);
        let binding = ModelBinding::bind("res.partner", &session()).unwrap();

        let records = remote.fetch_records(&binding).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some(1));

        let down = ModelBinding::bind("down", &session()).unwrap();
        assert!(remote.fetch_records(&down).await.is_err());
    }
}
