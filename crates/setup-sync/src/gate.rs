use crate::session::SessionHandle;

/// State value a module must be in to count as active.
pub const INSTALLED_STATE: &str = "installed";

/// Outcome of the dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCheckResult {
    Satisfied,
    /// Human-readable names of inactive modules, in registry order. Never empty.
    Unsatisfied(Vec<String>),
}

impl DependencyCheckResult {
    /// `Satisfied` when `missing` is empty.
    pub fn from_missing(missing: Vec<String>) -> Self {
        if missing.is_empty() {
            Self::Satisfied
        } else {
            Self::Unsatisfied(missing)
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// One entry of the remote module registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    pub state: String,
}

impl ModuleEntry {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.state == INSTALLED_STATE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

/// Read accessor over the locally synchronized module registry.
#[async_trait::async_trait]
pub trait ModuleRegistry: Send + Sync {
    /// Registry entries in their natural order.
    async fn modules(&self, session: &SessionHandle) -> Result<Vec<ModuleEntry>, RegistryError>;
}

#[async_trait::async_trait]
impl<T: ModuleRegistry + ?Sized> ModuleRegistry for std::sync::Arc<T> {
    async fn modules(&self, session: &SessionHandle) -> Result<Vec<ModuleEntry>, RegistryError> {
        (**self).modules(session).await
    }
}

/// Precondition checked once, after the first tier.
#[async_trait::async_trait]
pub trait DependencyGate: Send + Sync {
    async fn check(&self, session: &SessionHandle) -> DependencyCheckResult;
}

/// Gate backed by a [`ModuleRegistry`]: every module must be installed.
///
/// A registry that cannot be read is treated as empty.
pub struct RegistryGate<R> {
    registry: R,
}

impl<R: ModuleRegistry> RegistryGate<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }
}

#[async_trait::async_trait]
impl<R: ModuleRegistry> DependencyGate for RegistryGate<R> {
    async fn check(&self, session: &SessionHandle) -> DependencyCheckResult {
        let entries = match self.registry.modules(session).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    account = session.account(),
                    error = %e,
                    "module registry unreadable"
                );
                Vec::new()
            }
        };

        let missing: Vec<String> = entries
            .into_iter()
            .filter(|entry| !entry.is_installed())
            .inspect(|entry| {
                tracing::error!(
                    module = %entry.name,
                    state = %entry.state,
                    "dependency module not installed on server"
                );
            })
            .map(|entry| entry.name)
            .collect();

        DependencyCheckResult::from_missing(missing)
    }
}
