use std::fmt;
use std::sync::Arc;

/// Errors raised when a session cannot be established.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session has no account")]
    MissingAccount,
}

#[derive(Clone)]
struct SessionInner {
    account: String,
    database: String,
    server_url: Option<String>,
    token: Option<String>,
}

/// Read-only account identity threaded through every collaborator call.
///
/// Cloning is cheap; all clones share the same identity.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    pub fn new(
        account: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let account = account.into();
        if account.trim().is_empty() {
            return Err(SessionError::MissingAccount);
        }

        Ok(Self {
            inner: Arc::new(SessionInner {
                account,
                database: database.into(),
                server_url: None,
                token: None,
            }),
        })
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).server_url = Some(url.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).token = Some(token.into());
        self
    }

    pub fn account(&self) -> &str {
        &self.inner.account
    }

    pub fn database(&self) -> &str {
        &self.inner.database
    }

    pub fn server_url(&self) -> Option<&str> {
        self.inner.server_url.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.inner.token.as_deref()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("account", &self.inner.account)
            .field("database", &self.inner.database)
            .field("server_url", &self.inner.server_url)
            .field("token", &self.inner.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Input for a single orchestration run.
#[derive(Debug, Clone, Default)]
pub struct SetupConfig {
    /// `None` means no session could be established; the run never starts.
    pub session: Option<SessionHandle>,
    pub skip_dependency_check: bool,
}

impl SetupConfig {
    pub fn new(session: SessionHandle) -> Self {
        Self {
            session: Some(session),
            skip_dependency_check: false,
        }
    }

    pub fn skip_dependency_check(mut self, skip: bool) -> Self {
        self.skip_dependency_check = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_account_is_rejected() {
        assert_eq!(
            SessionHandle::new("  ", "db").unwrap_err(),
            SessionError::MissingAccount
        );
    }

    #[test]
    fn builder_sets_optional_fields() {
        let session = SessionHandle::new("admin", "prod")
            .unwrap()
            .with_server_url("https://erp.example.com")
            .with_token("secret");

        assert_eq!(session.account(), "admin");
        assert_eq!(session.database(), "prod");
        assert_eq!(session.server_url(), Some("https://erp.example.com"));
        assert_eq!(session.token(), Some("secret"));
    }

    #[test]
    fn debug_redacts_token() {
        let session = SessionHandle::new("admin", "prod")
            .unwrap()
            .with_token("secret");
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn clones_do_not_see_later_builder_changes() {
        let base = SessionHandle::new("admin", "prod").unwrap();
        let copy = base.clone();
        let with_url = base.with_server_url("http://localhost");
        assert_eq!(copy.server_url(), None);
        assert_eq!(with_url.server_url(), Some("http://localhost"));
    }

    #[test]
    fn config_defaults_to_running_the_check() {
        let session = SessionHandle::new("admin", "prod").unwrap();
        let config = SetupConfig::new(session);
        assert!(!config.skip_dependency_check);
        assert!(config.session.is_some());
        assert!(config.skip_dependency_check(true).skip_dependency_check);
    }
}
