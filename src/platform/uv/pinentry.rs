use std::time::Duration;

use async_trait::async_trait;

use super::{UserVerified, UserVerifier, UvError, UvPrompt};
use crate::config::UV_TIMEOUT_SECS;

/// Verifies the user with a PIN prompt shown by a `pinentry` program.
pub struct PinentryVerifier {
    binary: String,
    default_timeout: Duration,
}

impl PinentryVerifier {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            default_timeout: Duration::from_secs(UV_TIMEOUT_SECS),
        }
    }
}

#[async_trait]
impl UserVerifier for PinentryVerifier {
    async fn is_available(&self) -> Result<bool, UvError> {
        let bin = self.binary.clone();
        let probe = tokio::task::spawn_blocking(move || {
            std::process::Command::new(&bin).arg("--version").output()
        })
        .await
        .map_err(|e| UvError::Unavailable(e.to_string()))?;

        match probe {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(UvError::Unavailable(format!("cannot run '{}': {e}", self.binary))),
        }
    }

    async fn verify(&self, prompt: &UvPrompt) -> Result<UserVerified, UvError> {
        let title = prompt.title.clone();
        let description = prompt.description.clone();
        let bin = self.binary.clone();

        let join = tokio::task::spawn_blocking(move || {
            let input = pinentry::PassphraseInput::with_binary(&bin);
            match input {
                None => Err(pinentry::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "pinentry binary not found",
                ))),
                Some(mut input) => input
                    .with_title(&title)
                    .with_description(&description)
                    .with_ok("Verify")
                    .with_cancel("Deny")
                    .interact(),
            }
        });

        // The prompt itself cannot be withdrawn once shown; on timeout it is
        // left to the pinentry program.
        let limit = prompt.timeout.unwrap_or(self.default_timeout);
        match tokio::time::timeout(limit, join).await {
            Err(_) => Err(UvError::Timeout),
            Ok(Err(e)) => Err(UvError::Unavailable(e.to_string())),
            Ok(Ok(Ok(_))) => Ok(UserVerified { _private: () }),
            Ok(Ok(Err(pinentry::Error::Io(e)))) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(UvError::Unavailable(e.to_string()))
            }
            Ok(Ok(Err(_))) => Err(UvError::Denied),
        }
    }
}
