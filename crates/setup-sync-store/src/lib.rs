mod schema;

pub mod executor;
pub mod store;

pub use executor::StoreSyncExecutor;
pub use store::{LocalStore, RecordChange, SetupRecord, StoreError, SyncStatus};
