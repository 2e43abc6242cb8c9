use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Tracks which accounts have a setup run in flight.
///
/// The guard is process-local: orchestrators that share one `ActiveRuns`
/// cannot overlap for an account. Separate processes writing the same store
/// are not coordinated by it.
#[derive(Debug, Clone, Default)]
pub struct ActiveRuns {
    accounts: Arc<Mutex<HashSet<String>>>,
}

impl ActiveRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `account`. Returns `None` when a run already holds it.
    pub fn acquire(&self, account: &str) -> Option<RunToken> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        if !accounts.insert(account.to_owned()) {
            return None;
        }

        Some(RunToken {
            account: account.to_owned(),
            accounts: Arc::clone(&self.accounts),
        })
    }

    pub fn is_active(&self, account: &str) -> bool {
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(account)
    }
}

/// Releases its account when dropped.
#[derive(Debug)]
pub struct RunToken {
    account: String,
    accounts: Arc<Mutex<HashSet<String>>>,
}

impl RunToken {
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl Drop for RunToken {
    fn drop(&mut self) {
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.account);
    }
}
