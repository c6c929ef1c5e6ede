use crate::client::{TransportError, VerificationClient};
use crate::config::Config;
use crate::platform::PlatformCredentials;
use crate::support::{self, SupportState};

pub async fn check(
    cfg: &Config,
    client: &VerificationClient,
    platform: Option<&dyn PlatformCredentials>,
) -> anyhow::Result<()> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: bearer token configured
    if cfg.token.as_deref().is_none_or(str::is_empty) {
        errors.push(
            "no bearer token configured\n  \
             → sign in and pass the session token with --token or FINGERGATE_TOKEN"
                .to_string(),
        );
    }

    // Check 2: server healthy and token accepted
    match client.ping().await {
        Ok(()) => tracing::info!(server = %cfg.server, "Server healthy"),
        Err(TransportError::SessionExpired) => errors.push(
            "server rejected the bearer token (HTTP 401)\n  \
             → sign in again and refresh FINGERGATE_TOKEN"
                .to_string(),
        ),
        Err(TransportError::Server { message, .. }) => errors.push(format!(
            "health check failed: {message}\n  \
             → check that --server points at the API base, not the site root"
        )),
        Err(e) => errors.push(format!(
            "cannot reach {}: {e}\n  \
             → check --server or FINGERGATE_SERVER",
            cfg.server
        )),
    }

    // Check 3: user-verifying platform authenticator
    if let SupportState::Unsupported(reason) = support::probe(platform).await {
        errors.push(format!(
            "platform authenticator unavailable: {reason}\n  \
             → install pinentry or point --pinentry at a working binary (current: '{}')",
            cfg.pinentry
        ));
    }

    if errors.is_empty() {
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}
