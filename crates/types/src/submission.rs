//! Lifecycle of a single blob submission.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How the type-3 transaction gets paid for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundingMode {
    /// The remote key funds a fresh single-use account, which signs the blob
    /// transaction.
    #[default]
    Ephemeral,
    /// The remote key signs the blob transaction itself.
    Direct,
}

impl FundingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ephemeral => "ephemeral",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for FundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ephemeral" => Ok(Self::Ephemeral),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown funding mode `{other}`, expected `ephemeral` or `direct`")),
        }
    }
}

/// Stages a submission moves through.
///
/// ```text
/// Drafted → FeeEstimated → Funded → Signed → Submitted → Confirmed
///                 │                   ▲          ├─────→ TimedOut
///                 └───── direct ──────┘          │
///   (any non-terminal stage) ──────────────────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStage {
    Drafted,
    FeeEstimated,
    Funded,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    TimedOut,
}

impl SubmissionStage {
    pub const ALL: [Self; 8] = [
        Self::Drafted,
        Self::FeeEstimated,
        Self::Funded,
        Self::Signed,
        Self::Submitted,
        Self::Confirmed,
        Self::Failed,
        Self::TimedOut,
    ];

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::TimedOut)
    }

    /// Whether `self → next` is a legal transition.
    pub const fn can_advance_to(self, next: Self) -> bool {
        use SubmissionStage::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Drafted, FeeEstimated) |
            (FeeEstimated, Funded) |
            (FeeEstimated, Signed) |
            (Funded, Signed) |
            (Signed, Submitted) |
            (Submitted, Confirmed) |
            (Submitted, TimedOut) => true,
            _ => false,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drafted => "drafted",
            Self::FeeEstimated => "fee_estimated",
            Self::Funded => "funded",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
