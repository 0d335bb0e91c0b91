//! Job lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a print job.
///
/// `Queued → Previewing → Printing → Completed` is the happy path.
/// `Failed` is reachable from `Previewing` and `Printing`, `Cancelled`
/// from `Queued` and `Printing`, and a retry moves `Failed` back to
/// `Queued`. `Paused` is reserved and has no transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting for the worker to render a preview.
    Queued,
    /// Pages are being (or have been) rendered; awaiting confirmation.
    Previewing,
    /// Confirmed by the operator; waiting for final assembly.
    Printing,
    /// The output document was assembled.
    Completed,
    /// Cancelled by the operator.
    Cancelled,
    /// Rendering or assembly failed; see the job's error log.
    Failed,
    /// Reserved.
    Paused,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Previewing)
                | (Previewing, Printing)
                | (Printing, Completed)
                | (Previewing, Failed)
                | (Printing, Failed)
                | (Queued, Cancelled)
                | (Printing, Cancelled)
                | (Failed, Queued)
        )
    }

    /// Return the status as an uppercase string, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Previewing => "PREVIEWING",
            Self::Printing => "PRINTING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
