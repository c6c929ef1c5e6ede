use crate::client::TransportError;
use crate::codec::EncodingError;
use crate::platform::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("{0}")]
    EnvironmentUnsupported(String),
    #[error("malformed {field}: {source}")]
    Encoding {
        field: &'static str,
        source: EncodingError,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Ceremony(#[from] PlatformError),
    #[error("{0}")]
    VerificationRejected(String),
    #[error("ceremony abandoned")]
    Aborted,
}

impl GateError {
    /// Text shown to the user for this failure.
    pub fn diagnostic(&self) -> String {
        self.to_string()
    }

    /// Whether a fresh options fetch could succeed. A missing capability
    /// and an expired session both need the user before anything changes.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::EnvironmentUnsupported(_)
                | Self::Aborted
                | Self::Transport(TransportError::SessionExpired)
        )
    }
}

pub type Result<T, E = GateError> = std::result::Result<T, E>;
