use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Synchronization tier. Tiers run strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Base data, including the module registry the dependency gate reads.
    High,
    /// Groups and access rights.
    Medium,
    /// External identifiers.
    Low,
    /// Master records referenced by everything else.
    Default,
}

impl Priority {
    /// Every tier, in execution order.
    pub const ALL: [Priority; 4] = [
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Default => "default",
        }
    }

    /// What the tier carries, for log lines.
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "base data",
            Self::Medium => "access rights",
            Self::Low => "external identifiers",
            Self::Default => "master records",
        }
    }

    /// Zero-based position in [`Priority::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Default => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0}")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "default" => Ok(Self::Default),
            other => Err(UnknownPriority(other.to_owned())),
        }
    }
}
