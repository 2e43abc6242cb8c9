pub mod catalog;
pub mod descriptor;
pub mod event;
pub mod feedback;
pub mod gate;
pub mod guard;
pub mod orchestrator;
pub mod priority;
pub mod session;
pub mod sync;

pub use catalog::{CatalogError, ModelCatalog, ModelCatalogBuilder};
pub use descriptor::{ConstructionError, ModelBinding, ModelDescriptor, ModelFactory, ModelRegistry};
pub use event::{ChannelSink, EventSink, SetupEvent, SetupProgress};
pub use feedback::Feedback;
pub use gate::{
    DependencyCheckResult, DependencyGate, INSTALLED_STATE, ModuleEntry, ModuleRegistry,
    RegistryError, RegistryGate,
};
pub use guard::{ActiveRuns, RunToken};
pub use orchestrator::{
    SetupError, SetupOrchestrator, SetupOutcome, SetupReport, SetupState, TOTAL_TIERS, TierReport,
};
pub use priority::{Priority, UnknownPriority};
pub use session::{SessionError, SessionHandle, SetupConfig};
pub use sync::{RemoteError, RemoteRecord, RemoteSource, SyncExecutor, SyncOutcome, SyncStats};
pub use tokio_util::sync::CancellationToken;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
