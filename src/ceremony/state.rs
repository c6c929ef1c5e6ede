use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Idle,
    CheckingSupport,
    /// The environment lacks the capability. Terminal.
    Blocked { reason: String },
    Ready,
    Enrolling,
    /// Terminal.
    Succeeded,
    /// The last attempt failed; enrollment may be started again.
    Failed { diagnostic: String },
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::Succeeded)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingSupport => "checking-support",
            Self::Blocked { .. } => "blocked",
            Self::Ready => "ready",
            Self::Enrolling => "enrolling",
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked { reason } => write!(f, "blocked: {reason}"),
            Self::Failed { diagnostic } => write!(f, "failed: {diagnostic}"),
            other => f.write_str(other.name()),
        }
    }
}

/// Notifications delivered to whoever hosts the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// Sent once, on entering `Succeeded`.
    Passed,
    /// Sent on every transition into `Blocked` or `Failed`.
    Failed(String),
}

/// Why a start request did not begin a ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StartRejected {
    #[error("an enrollment is already in progress")]
    InProgress,
    #[error("support check has not completed")]
    NotReady,
    #[error("already enrolled")]
    AlreadyEnrolled,
    #[error("this device cannot enroll")]
    Blocked,
    #[error("gate has been torn down")]
    TornDown,
}
