use std::sync::Arc;

use setup_sync::{
    ConstructionError, ModelDescriptor, RemoteSource, SessionHandle, SyncExecutor, SyncOutcome,
};

use crate::store::LocalStore;

/// Pulls one model from a remote source into the local store.
///
/// Pull only: local changes are never pushed upstream during setup.
pub struct StoreSyncExecutor {
    store: Arc<LocalStore>,
    remote: Arc<dyn RemoteSource>,
}

impl StoreSyncExecutor {
    pub fn new(store: Arc<LocalStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self { store, remote }
    }
}

#[async_trait::async_trait]
impl SyncExecutor for StoreSyncExecutor {
    async fn synchronize(
        &self,
        descriptor: &ModelDescriptor,
        session: &SessionHandle,
    ) -> Result<SyncOutcome, ConstructionError> {
        let binding = descriptor.construct(session)?;

        let records = match self.remote.fetch_records(&binding).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    model = %binding.model,
                    remote = self.remote.label(),
                    error = %e,
                    "fetch failed"
                );
                return Ok(SyncOutcome::failed(e.to_string()));
            }
        };

        let stats = match self.store.apply_records(&binding.model, &records) {
            Ok(stats) => stats,
            Err(e) => return Ok(SyncOutcome::failed(e.to_string())),
        };

        if let Err(e) = self.store.record_model_sync(&binding.model) {
            tracing::warn!(model = %binding.model, error = %e, "could not record sync time");
        }

        Ok(SyncOutcome::Synced(stats))
    }
}
