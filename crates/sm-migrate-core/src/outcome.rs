//! Per-item migration outcomes and the run summary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one processed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Dry-run mode: the item was fetched but never posted
    DryRun,
    /// Destination accepted the item (200/201)
    Posted,
    /// Destination already had the item (409)
    Skipped,
    /// Fetch or post failed
    Failed,
}

impl OutcomeKind {
    /// Classify a destination or registry POST status.
    ///
    /// 409 is an idempotent success, not an error.
    #[must_use]
    pub fn from_post_status(status: u16) -> Self {
        match status {
            200 | 201 => Self::Posted,
            409 => Self::Skipped,
            _ => Self::Failed,
        }
    }

    /// Whether the item is known to exist at the destination.
    #[must_use]
    pub fn is_present(self) -> bool {
        matches!(self, Self::Posted | Self::Skipped)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry_run"),
            Self::Posted => write!(f, "posted"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one processed item, labelled by the item's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Classification
    pub kind: OutcomeKind,
    /// Item label (resource `id`, or the submodel URN when the fetch failed)
    pub label: String,
}

impl Outcome {
    /// Create a new outcome.
    #[must_use]
    pub fn new(kind: OutcomeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }

    /// Shorthand for a dry-run outcome.
    #[must_use]
    pub fn dry_run(label: impl Into<String>) -> Self {
        Self::new(OutcomeKind::DryRun, label)
    }

    /// Shorthand for a failed outcome.
    #[must_use]
    pub fn failed(label: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Failed, label)
    }
}

/// Counters aggregated over a whole run.
///
/// Dry-run outcomes count toward `total` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Every recorded outcome
    pub total: usize,
    /// Posted outcomes
    pub posted: usize,
    /// Skipped (409) outcomes
    pub skipped: usize,
    /// Failed outcomes
    pub failed: usize,
}

impl MigrationSummary {
    /// Tally one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome.kind {
            OutcomeKind::DryRun => {}
            OutcomeKind::Posted => self.posted += 1,
            OutcomeKind::Skipped => self.skipped += 1,
            OutcomeKind::Failed => self.failed += 1,
        }
    }
}

impl<'a> FromIterator<&'a Outcome> for MigrationSummary {
    fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total:         {}", self.total)?;
        writeln!(f, "Posted:        {}", self.posted)?;
        writeln!(f, "Skipped (409): {}", self.skipped)?;
        write!(f, "Failed:        {}", self.failed)
    }
}
