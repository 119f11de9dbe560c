/// Worker state definitions for tracking crawl progress
///
/// This module defines every state a partition worker moves through while
/// processing one URL.
use std::fmt;

/// Represents the current state of a partition worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    // ===== Idle =====
    /// Waiting for the partition to have a pending URL
    WaitingForWork,

    // ===== Per-URL States =====
    /// Checking the host's crawl policy for the dequeued URL
    PolicyCheck,

    /// Fetching the page through the transport
    Fetching,

    /// Fingerprinting, classifying and extracting links
    Extracting,

    /// Sleeping the politeness delay after a URL
    Pacing,

    // ===== Terminal State =====
    /// Every partition is empty with nothing in flight, or the crawl was aborted
    Stopped,
}

impl WorkerState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true while the worker holds a dequeued URL
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            Self::PolicyCheck | Self::Fetching | Self::Extracting | Self::Pacing
        )
    }

    /// Returns true if the worker may move from this state to `next`
    ///
    /// A disallowed URL skips straight from `PolicyCheck` to `Pacing`, and a
    /// failed fetch skips `Extracting`.
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (WaitingForWork, PolicyCheck)
                | (WaitingForWork, Stopped)
                | (PolicyCheck, Fetching)
                | (PolicyCheck, Pacing)
                | (Fetching, Extracting)
                | (Fetching, Pacing)
                | (Extracting, Pacing)
                | (Pacing, WaitingForWork)
                | (Pacing, Stopped)
        )
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForWork => "waiting_for_work",
            Self::PolicyCheck => "policy_check",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Pacing => "pacing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
