pub mod assertion;
pub mod ceremony;
pub mod client;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod platform;
pub mod support;

use std::sync::Arc;
use std::time::Duration;

pub use ceremony::{EnrollOutcome, GateEvent, GateState, Orchestrator};
pub use error::GateError;
pub use support::SupportState;

use client::{AuthContext, ReqwestTransport, VerificationClient};
use platform::uv::PinentryVerifier;
use platform::{PlatformCredentials, SoftAuthenticator};

pub async fn run(cfg: config::Config) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;
    let level = match cfg.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .init();

    tracing::info!(server = %cfg.server, "Starting fingergate");

    let auth = Arc::new(AuthContext::new(cfg.token.clone()));
    let transport = ReqwestTransport::new(cfg.server.clone(), auth)?;
    let client = VerificationClient::new(Arc::new(transport));
    let verifier = Arc::new(PinentryVerifier::new(cfg.pinentry.clone()));
    let platform: Arc<dyn PlatformCredentials> =
        Arc::new(SoftAuthenticator::new(cfg.origin.clone(), verifier));

    if cfg.doctor {
        diagnostics::check(&cfg, &client, Some(platform.as_ref())).await?;
        println!("All preflight checks passed");
        return Ok(());
    }

    let (gate, mut events) = Orchestrator::new(Some(platform.clone()), client.clone());
    let gate = gate.with_ceremony_timeout(cfg.ceremony_timeout.map(Duration::from_secs));

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                GateEvent::Passed => println!("Enrollment passed"),
                GateEvent::Failed(diagnostic) => eprintln!("Enrollment failed: {diagnostic}"),
            }
        }
    });

    let result = match gate.activate().await {
        SupportState::Supported => {
            tokio::select! {
                result = enroll_with_retries(&gate, cfg.attempts) => result,
                _ = tokio::signal::ctrl_c() => {
                    gate.teardown();
                    Err(anyhow::anyhow!("interrupted"))
                }
            }
        }
        SupportState::Unsupported(reason) => {
            Err(anyhow::anyhow!("cannot enroll on this device: {reason}"))
        }
        SupportState::Unknown => Err(anyhow::anyhow!("support check did not complete")),
    };

    // Closing the event channel lets the printer drain and exit.
    drop(gate);
    printer.await?;
    result?;

    if cfg.confirm {
        assertion::authenticate(platform.as_ref(), &client).await?;
        println!("Sign-in confirmed");
    }
    Ok(())
}

async fn enroll_with_retries(gate: &Orchestrator, attempts: u32) -> anyhow::Result<()> {
    for attempt in 1..=attempts {
        match gate.enroll().await {
            EnrollOutcome::Passed => return Ok(()),
            EnrollOutcome::Failed(e) if e.is_retryable() && attempt < attempts => {
                tracing::info!(attempt, attempts, "Retrying enrollment with fresh options");
            }
            EnrollOutcome::Failed(e) => return Err(e.into()),
            EnrollOutcome::Rejected(rejected) => anyhow::bail!("enrollment not started: {rejected}"),
            EnrollOutcome::Discarded => anyhow::bail!("enrollment abandoned"),
        }
    }
    anyhow::bail!("enrollment failed after {attempts} attempt(s)")
}
