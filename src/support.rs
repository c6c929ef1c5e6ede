use crate::platform::PlatformCredentials;

pub const NO_PLATFORM_API: &str = "no platform credential API";
pub const NO_BIOMETRIC_PERIPHERAL: &str = "no biometric peripheral detected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportState {
    /// Probe still running. Never returned by [`probe`].
    Unknown,
    Unsupported(String),
    Supported,
}

impl SupportState {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

/// Query the platform for a user-verifying authenticator.
///
/// Each call issues a fresh query; nothing is cached.
pub async fn probe(platform: Option<&dyn PlatformCredentials>) -> SupportState {
    let Some(platform) = platform else {
        return SupportState::Unsupported(NO_PLATFORM_API.to_string());
    };

    match platform.is_user_verifying_platform_authenticator_available().await {
        Ok(true) => SupportState::Supported,
        Ok(false) => SupportState::Unsupported(NO_BIOMETRIC_PERIPHERAL.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Availability query failed");
            SupportState::Unsupported(e.to_string())
        }
    }
}
