use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::{ConstructionError, ModelBinding, ModelDescriptor};
use crate::session::SessionHandle;

/// Record counts for one model (or an aggregate of several).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
    pub failed: u64,
}

impl SyncStats {
    /// Number of records touched, failures included.
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.deleted + self.failed
    }

    pub fn merge(&mut self, other: &SyncStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.failed += other.failed;
    }
}

impl AddAssign<&SyncStats> for SyncStats {
    fn add_assign(&mut self, rhs: &SyncStats) {
        self.merge(rhs);
    }
}

/// Result of synchronizing one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The exchange ran; per-record failures are in `failed`.
    Synced(SyncStats),
    /// The whole model failed (e.g. the transport was unreachable).
    Failed { cause: String },
}

impl SyncOutcome {
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::Failed {
            cause: cause.into(),
        }
    }

    pub fn stats(&self) -> Option<&SyncStats> {
        match self {
            Self::Synced(stats) => Some(stats),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Synchronizes one model against the remote.
///
/// Ordinary data failures are reported inside [`SyncOutcome`]. An `Err` means
/// the model could not be constructed or bound to the session at all.
#[async_trait::async_trait]
pub trait SyncExecutor: Send + Sync {
    async fn synchronize(
        &self,
        descriptor: &ModelDescriptor,
        session: &SessionHandle,
    ) -> Result<SyncOutcome, ConstructionError>;
}

#[async_trait::async_trait]
impl<T: SyncExecutor + ?Sized> SyncExecutor for std::sync::Arc<T> {
    async fn synchronize(
        &self,
        descriptor: &ModelDescriptor,
        session: &SessionHandle,
    ) -> Result<SyncOutcome, ConstructionError> {
        (**self).synchronize(descriptor, session).await
    }
}

/// One record as served by a remote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRecord {
    pub values: Map<String, Value>,
}

impl RemoteRecord {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Server-side identifier, when present and integral.
    pub fn id(&self) -> Option<i64> {
        self.values.get("id").and_then(Value::as_i64)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }
}

/// Errors from a remote source.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no snapshot of {model} at {location}")]
    NotFound { model: String, location: String },

    #[error("unexpected status {status} for {model}")]
    Status { model: String, status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

/// Serves the records of one model for a bound session.
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
    /// Human-readable label identifying this remote.
    fn label(&self) -> &str;

    /// Fetch every record of the bound model.
    async fn fetch_records(&self, binding: &ModelBinding) -> Result<Vec<RemoteRecord>, RemoteError>;
}

#[async_trait::async_trait]
impl<T: RemoteSource + ?Sized> RemoteSource for std::sync::Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn fetch_records(
        &self,
        binding: &ModelBinding,
    ) -> Result<Vec<RemoteRecord>, RemoteError> {
        (**self).fetch_records(binding).await
    }
}
