use serde::Deserialize;
use serde_json::Value;
use setup_sync::{RemoteError, RemoteRecord};

/// Snapshot bodies are either a bare array or `{"records": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotBody {
    Bare(Vec<Value>),
    Wrapped { records: Vec<Value> },
}

/// Parse a snapshot body. Non-object entries are dropped.
pub(crate) fn parse_records(model: &str, body: &str) -> Result<Vec<RemoteRecord>, RemoteError> {
    let parsed: SnapshotBody = serde_json::from_str(body)
        .map_err(|e| RemoteError::Parse(format!("{model}: {e}")))?;

    let values = match parsed {
        SnapshotBody::Bare(values) | SnapshotBody::Wrapped { records: values } => values,
    };

    let total = values.len();
    let records: Vec<RemoteRecord> = values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(RemoteRecord::new(map)),
            _ => None,
        })
        .collect();

    if records.len() < total {
        tracing::warn!(model, dropped = total - records.len(), "non-object entries in snapshot");
    }

    Ok(records)
}

/// File-safe form of a model name (`res.partner` -> `res_partner`).
pub(crate) fn file_stem(model: &str) -> String {
    model.replace('.', "_")
}
