use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::session::SessionHandle;

/// Errors raised when a model cannot be constructed or bound to a session.
///
/// These are configuration faults, not data faults: the orchestrator logs
/// them and moves on to the next model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    #[error("no factory registered for model {0}")]
    MissingFactory(String),

    #[error("cannot bind {model} to session: {reason}")]
    Unbound { model: String, reason: String },
}

/// A model bound to a session, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBinding {
    pub model: String,
    pub account: String,
    pub database: String,
}

impl ModelBinding {
    /// Standard binding: ties the model name to the session's account and
    /// database. Fails when the session has no database selected.
    pub fn bind(model: &str, session: &SessionHandle) -> Result<Self, ConstructionError> {
        if session.database().trim().is_empty() {
            return Err(ConstructionError::Unbound {
                model: model.to_owned(),
                reason: "session has no database".into(),
            });
        }

        Ok(Self {
            model: model.to_owned(),
            account: session.account().to_owned(),
            database: session.database().to_owned(),
        })
    }
}

/// Constructs a session-bound model.
pub type ModelFactory =
    Arc<dyn Fn(&SessionHandle) -> Result<ModelBinding, ConstructionError> + Send + Sync>;

/// Identifies one syncable collection plus how to construct it.
#[derive(Clone)]
pub struct ModelDescriptor {
    name: String,
    factory: ModelFactory,
}

impl ModelDescriptor {
    /// Descriptor using the standard [`ModelBinding::bind`] factory.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let model = name.clone();
        Self {
            name,
            factory: Arc::new(move |session| ModelBinding::bind(&model, session)),
        }
    }

    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&SessionHandle) -> Result<ModelBinding, ConstructionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    /// Descriptor whose construction always fails with `MissingFactory`.
    pub fn unresolved(name: impl Into<String>) -> Self {
        let name = name.into();
        let missing = name.clone();
        Self {
            name,
            factory: Arc::new(move |_| Err(ConstructionError::MissingFactory(missing.clone()))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self, session: &SessionHandle) -> Result<ModelBinding, ConstructionError> {
        (self.factory)(session)
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registration table mapping a model name to its factory.
///
/// Built once at startup. In strict mode, names without a registered factory
/// resolve to an unresolved descriptor; in permissive mode they get the
/// standard binding.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
    permissive: bool,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        Self {
            factories: HashMap::new(),
            permissive: true,
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&SessionHandle) -> Result<ModelBinding, ConstructionError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register `name` with the standard binding factory.
    pub fn register_standard(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let model = name.clone();
        self.register(name, move |session| ModelBinding::bind(&model, session))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> ModelDescriptor {
        match self.factories.get(name) {
            Some(factory) => ModelDescriptor {
                name: name.to_owned(),
                factory: Arc::clone(factory),
            },
            None if self.permissive => ModelDescriptor::new(name),
            None => ModelDescriptor::unresolved(name),
        }
    }
}
