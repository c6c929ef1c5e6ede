pub(crate) mod pinentry;
pub(crate) mod prompt;

use async_trait::async_trait;

use super::PlatformError;

pub use self::pinentry::PinentryVerifier;
pub use prompt::UvPrompt;
pub(crate) use prompt::{get_assertion_prompt, make_credential_prompt};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UvError {
    #[error("user denied verification")]
    Denied,
    #[error("user verification timed out")]
    Timeout,
    #[error("user verification unavailable: {0}")]
    Unavailable(String),
}

impl From<UvError> for PlatformError {
    fn from(e: UvError) -> Self {
        match e {
            UvError::Denied => PlatformError::NotAllowed(e.to_string()),
            UvError::Timeout => PlatformError::Timeout,
            UvError::Unavailable(msg) => PlatformError::Unavailable(msg),
        }
    }
}

/// Proof that the user was verified. Only verifiers can mint one.
pub struct UserVerified {
    pub(crate) _private: (),
}

impl UserVerified {
    /// Construct a proof for use in tests only.
    /// Do not use in production code: this bypasses user verification.
    #[doc(hidden)]
    pub fn test_only() -> Self {
        Self { _private: () }
    }
}

#[async_trait]
pub trait UserVerifier: Send + Sync {
    /// Whether the verification backend can be used on this machine.
    async fn is_available(&self) -> Result<bool, UvError>;

    async fn verify(&self, prompt: &UvPrompt) -> Result<UserVerified, UvError>;
}
