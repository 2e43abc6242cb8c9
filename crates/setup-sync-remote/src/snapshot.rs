use std::path::{Path, PathBuf};

use setup_sync::{ModelBinding, RemoteError, RemoteRecord, RemoteSource};

use crate::payload::{file_stem, parse_records};

/// Serves records from a directory of JSON snapshots, one file per model
/// (`res.partner` is read from `res_partner.json`).
///
/// A model without a snapshot file is an error, not an empty model: the
/// local copy is left untouched.
#[derive(Debug, Clone)]
pub struct SnapshotRemote {
    root: PathBuf,
    label: String,
}

impl SnapshotRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let label = format!("snapshot:{}", root.display());
        Self { root, label }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, model: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(model)))
    }
}

#[async_trait::async_trait]
impl RemoteSource for SnapshotRemote {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch_records(
        &self,
        binding: &ModelBinding,
    ) -> Result<Vec<RemoteRecord>, RemoteError> {
        let path = self.path_for(&binding.model);

        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RemoteError::NotFound {
                    model: binding.model.clone(),
                    location: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(RemoteError::Io(format!("{}: {e}", path.display())));
            }
        };

        parse_records(&binding.model, &body)
    }
}
