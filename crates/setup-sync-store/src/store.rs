use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use setup_sync::{
    ModuleEntry, ModuleRegistry, RegistryError, RemoteRecord, SessionHandle, SetupOutcome,
    SyncStats,
};

use crate::schema;

/// Model holding the server's module registry.
pub const DEFAULT_REGISTRY_MODEL: &str = "ir.module.module";

/// How fresh the local copy of a model is.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    NeverSynced,
    Stale { days_old: u64 },
    Fresh { days_old: u64 },
}

/// Threshold in days before a model is considered stale.
const STALE_THRESHOLD_DAYS: u64 = 7;

/// What an upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Inserted,
    Updated,
    Unchanged,
}

/// The last recorded setup run for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRecord {
    pub outcome: String,
    pub missing: Vec<String>,
    pub finished_at: u64,
}

/// SQLite-backed local copy of the synchronized models.
pub struct LocalStore {
    conn: Mutex<rusqlite::Connection>,
    registry_model: String,
}

impl LocalStore {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: rusqlite::Connection) -> Result<Self, StoreError> {
        schema::migrations()
            .to_latest(&mut conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            registry_model: DEFAULT_REGISTRY_MODEL.to_owned(),
        })
    }

    /// Read module registry entries from `model` instead of the default.
    pub fn with_registry_model(mut self, model: impl Into<String>) -> Self {
        self.registry_model = model.into();
        self
    }

    pub fn registry_model(&self) -> &str {
        &self.registry_model
    }

    fn conn(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    /// Check how fresh the local copy of `model` is.
    pub fn model_status(&self, model: &str) -> Result<SyncStatus, StoreError> {
        let conn = self.conn()?;

        let result: Option<Option<String>> = conn
            .query_row(
                "SELECT last_synced_at FROM models WHERE name = ?1",
                [model],
                |row| row.get(0),
            )
            .ok();

        match result {
            None | Some(None) => Ok(SyncStatus::NeverSynced),
            Some(Some(timestamp)) => {
                let days_old = days_since(&timestamp).unwrap_or(0);
                if days_old >= STALE_THRESHOLD_DAYS {
                    Ok(SyncStatus::Stale { days_old })
                } else {
                    Ok(SyncStatus::Fresh { days_old })
                }
            }
        }
    }

    /// Record the sync timestamp for `model`.
    pub fn record_model_sync(&self, model: &str) -> Result<(), StoreError> {
        self.set_last_synced_at(model, now_epoch_secs())
    }

    /// Set the last_synced_at timestamp manually (for testing staleness).
    pub fn set_last_synced_at(&self, model: &str, epoch_secs: u64) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO models (name, last_synced_at) VALUES (?1, ?2)",
            rusqlite::params![model, epoch_secs.to_string()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert or replace one record.
    pub fn upsert_record(
        &self,
        model: &str,
        record: &RemoteRecord,
    ) -> Result<RecordChange, StoreError> {
        let id = record.id().ok_or_else(|| {
            StoreError::InvalidRecord(format!("{model}: record has no integer id"))
        })?;
        let payload = serde_json::to_string(&record.values)
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

        let conn = self.conn()?;
        upsert(&conn, model, id, &payload)
    }

    /// Make the local copy of `model` match `records`.
    ///
    /// Records without an integer id are counted as failed; a repeated id
    /// counts once, with its last payload. Local rows absent from `records`
    /// are deleted. Runs in a single transaction.
    pub fn apply_records(
        &self,
        model: &str,
        records: &[RemoteRecord],
    ) -> Result<SyncStats, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut stats = SyncStats::default();
        let mut latest: Vec<(i64, String)> = Vec::with_capacity(records.len());
        let mut positions: HashMap<i64, usize> = HashMap::with_capacity(records.len());

        for record in records {
            let Some(id) = record.id() else {
                tracing::warn!(model, "record without integer id");
                stats.failed += 1;
                continue;
            };
            let payload = match serde_json::to_string(&record.values) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(model, id, error = %e, "record not serializable");
                    stats.failed += 1;
                    continue;
                }
            };

            match positions.get(&id) {
                Some(&index) => {
                    tracing::debug!(model, id, "duplicate id in payload, keeping last");
                    latest[index].1 = payload;
                }
                None => {
                    positions.insert(id, latest.len());
                    latest.push((id, payload));
                }
            }
        }

        for (id, payload) in &latest {
            match upsert(&tx, model, *id, payload)? {
                RecordChange::Inserted => stats.inserted += 1,
                RecordChange::Updated => stats.updated += 1,
                RecordChange::Unchanged => {}
            }
        }

        let existing = ids_for(&tx, model)?;
        for id in existing.into_iter().filter(|id| !positions.contains_key(id)) {
            tx.execute(
                "DELETE FROM records WHERE model = ?1 AND id = ?2",
                rusqlite::params![model, id],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;
            stats.deleted += 1;
        }

        tx.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(stats)
    }

    /// All stored records of `model`, ordered by id.
    pub fn records(&self, model: &str) -> Result<Vec<RemoteRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT payload FROM records WHERE model = ?1 ORDER BY id")
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let payloads: Vec<String> = stmt
            .query_map([model], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(payloads
            .iter()
            .filter_map(|p| serde_json::from_str(p).ok())
            .map(RemoteRecord::new)
            .collect())
    }

    pub fn record_count(&self, model: &str) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM records WHERE model = ?1",
            [model],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count.max(0) as u64)
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Remember how the last setup run for `account` ended.
    pub fn record_setup(&self, account: &str, outcome: &SetupOutcome) -> Result<(), StoreError> {
        let (label, missing) = match outcome {
            SetupOutcome::Completed => ("completed", Vec::new()),
            SetupOutcome::DependencyFailed(missing) => ("dependency_failed", missing.clone()),
        };
        let missing_json =
            serde_json::to_string(&missing).map_err(|e| StoreError::Database(e.to_string()))?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO setup_runs (account, outcome, missing_json, finished_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![account, label, missing_json, now_epoch_secs().to_string()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn last_setup(&self, account: &str) -> Result<Option<SetupRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT outcome, missing_json, finished_at FROM setup_runs WHERE account = ?1",
            [account],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        );

        match row {
            Ok((outcome, missing_json, finished_at)) => Ok(Some(SetupRecord {
                outcome,
                missing: serde_json::from_str(&missing_json).unwrap_or_default(),
                finished_at: finished_at.parse().unwrap_or(0),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    /// Module registry entries as stored locally, in id order.
    pub fn module_entries(&self) -> Result<Vec<ModuleEntry>, StoreError> {
        Ok(self
            .records(&self.registry_model)?
            .iter()
            .map(module_entry)
            .collect())
    }
}

#[async_trait::async_trait]
impl ModuleRegistry for LocalStore {
    async fn modules(&self, _session: &SessionHandle) -> Result<Vec<ModuleEntry>, RegistryError> {
        self.module_entries()
            .map_err(|e| RegistryError::Storage(e.to_string()))
    }
}

fn module_entry(record: &RemoteRecord) -> ModuleEntry {
    let name = record
        .get_str("shortdesc")
        .or_else(|| record.get_str("name"))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("#{}", record.id().unwrap_or_default()));
    let state = record.get_str("state").unwrap_or_default();
    ModuleEntry::new(name, state)
}

fn upsert(
    conn: &rusqlite::Connection,
    model: &str,
    id: i64,
    payload: &str,
) -> Result<RecordChange, StoreError> {
    let current: Option<String> = conn
        .query_row(
            "SELECT payload FROM records WHERE model = ?1 AND id = ?2",
            rusqlite::params![model, id],
            |row| row.get(0),
        )
        .ok();

    let change = match current.as_deref() {
        None => RecordChange::Inserted,
        Some(existing) if existing == payload => return Ok(RecordChange::Unchanged),
        Some(_) => RecordChange::Updated,
    };

    conn.execute(
        "INSERT OR REPLACE INTO records (model, id, payload) VALUES (?1, ?2, ?3)",
        rusqlite::params![model, id, payload],
    )
    .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(change)
}

fn ids_for(conn: &rusqlite::Connection, model: &str) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT id FROM records WHERE model = ?1")
        .map_err(|e| StoreError::Database(e.to_string()))?;

    let ids = stmt
        .query_map([model], |row| row.get(0))
        .map_err(|e| StoreError::Database(e.to_string()))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(ids)
}

/// Errors specific to store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

fn now_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn days_since(timestamp: &str) -> Option<u64> {
    let then: u64 = timestamp.parse().ok()?;
    Some(now_epoch_secs().saturating_sub(then) / 86400)
}
