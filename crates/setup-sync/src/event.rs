use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Number of completed tiers out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupProgress {
    pub completed_tiers: u32,
    pub total_tiers: u32,
}

impl SetupProgress {
    pub fn new(completed_tiers: u32, total_tiers: u32) -> Self {
        Self {
            completed_tiers,
            total_tiers,
        }
    }

    /// Integer percentage, truncated.
    pub fn percent(&self) -> u32 {
        if self.total_tiers == 0 {
            return 100;
        }
        self.completed_tiers * 100 / self.total_tiers
    }

    pub fn is_complete(&self) -> bool {
        self.completed_tiers >= self.total_tiers
    }
}

/// Externally observable artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SetupEvent {
    Progress(SetupProgress),
    DependencyError { missing: Vec<String> },
    Completed,
}

impl SetupEvent {
    /// True for the events that end a run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Fire-and-forget delivery of setup events, in emission order.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SetupEvent);
}

impl<F> EventSink for F
where
    F: Fn(SetupEvent) + Send + Sync,
{
    fn emit(&self, event: SetupEvent) {
        self(event)
    }
}

/// Writes events into a tokio channel. A dropped receiver is not an error.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SetupEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<SetupEvent>) -> Self {
        Self { tx }
    }

    /// A sink plus the receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SetupEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: SetupEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("setup event dropped: no receiver");
        }
    }
}
