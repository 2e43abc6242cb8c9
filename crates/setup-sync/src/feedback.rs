use crate::event::SetupEvent;
use crate::orchestrator::TierReport;

/// User-facing message derived from setup events and reports.
///
/// Callers decide how to present it (the CLI prints to stderr, other
/// consumers can log or ignore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Informational message (progress, status updates).
    Info(String),
    /// Warning - setup continued but something noteworthy occurred.
    Warning(String),
    /// Error - the run cannot continue.
    Error(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) | Self::Error(msg) => msg,
        }
    }

    /// Warnings for models that were skipped or failed in a tier.
    pub fn for_tier(report: &TierReport) -> Vec<Feedback> {
        let mut feedback = Vec::new();
        for model in &report.skipped_models {
            feedback.push(Self::warning(format!(
                "[{}] skipped {model}: could not be constructed",
                report.priority
            )));
        }
        for model in &report.failed_models {
            feedback.push(Self::warning(format!(
                "[{}] {model} failed to sync",
                report.priority
            )));
        }
        if report.stats.failed > 0 {
            feedback.push(Self::warning(format!(
                "[{}] {} record(s) failed",
                report.priority, report.stats.failed
            )));
        }
        feedback
    }
}

impl From<&SetupEvent> for Feedback {
    fn from(event: &SetupEvent) -> Self {
        match event {
            SetupEvent::Progress(progress) => Self::info(format!(
                "Setup {}% ({}/{} tiers)",
                progress.percent(),
                progress.completed_tiers,
                progress.total_tiers
            )),
            SetupEvent::DependencyError { missing } => Self::error(format!(
                "required modules not installed on server: {}",
                missing.join(", ")
            )),
            SetupEvent::Completed => Self::info("Setup finished."),
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
