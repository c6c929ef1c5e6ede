pub(crate) mod material;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

pub use state::{GateEvent, GateState, StartRejected};

use crate::client::VerificationClient;
use crate::error::GateError;
use crate::platform::{CreationOptions, PlatformCredentials, PlatformError, PublicKeyCredential};
use crate::support::{self, NO_PLATFORM_API, SupportState};

/// Diagnostic used when the server declines without saying why.
pub const VERIFICATION_FAILED: &str = "verification failed";

/// Result of one [`Orchestrator::enroll`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    Passed,
    Failed(GateError),
    /// No ceremony was started.
    Rejected(StartRejected),
    /// The gate was torn down while the ceremony was in flight.
    Discarded,
}

struct Inner {
    state: GateState,
    support: SupportState,
}

/// At most one ceremony runs at a time; a second start is rejected, not
/// queued. After [`Orchestrator::teardown`] no in-flight result touches the
/// state or reaches the event channel.
pub struct Orchestrator {
    platform: Option<Arc<dyn PlatformCredentials>>,
    client: VerificationClient,
    ceremony_timeout: Option<Duration>,
    inner: Mutex<Inner>,
    torn_down: AtomicBool,
    events: mpsc::UnboundedSender<GateEvent>,
}

impl Orchestrator {
    /// `platform` is `None` when the environment has no credential API at all.
    pub fn new(
        platform: Option<Arc<dyn PlatformCredentials>>,
        client: VerificationClient,
    ) -> (Self, mpsc::UnboundedReceiver<GateEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            platform,
            client,
            ceremony_timeout: None,
            inner: Mutex::new(Inner {
                state: GateState::Idle,
                support: SupportState::Unknown,
            }),
            torn_down: AtomicBool::new(false),
            events,
        };
        (orchestrator, rx)
    }

    /// Bound the platform ceremony. Unbounded unless set.
    pub fn with_ceremony_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ceremony_timeout = timeout;
        self
    }

    pub fn state(&self) -> GateState {
        self.lock().state.clone()
    }

    pub fn support_state(&self) -> SupportState {
        self.lock().support.clone()
    }

    /// Run the support check. Only the first call from `Idle` probes; later
    /// calls report the known support state.
    pub async fn activate(&self) -> SupportState {
        {
            let mut inner = self.lock();
            if self.is_torn_down() || inner.state != GateState::Idle {
                return inner.support.clone();
            }
            transition(&mut inner, GateState::CheckingSupport);
        }

        let support = support::probe(self.platform.as_deref()).await;

        let mut inner = self.lock();
        if self.is_torn_down() {
            tracing::debug!("Support result arrived after teardown, dropped");
            return support;
        }
        inner.support = support.clone();
        match &support {
            SupportState::Supported => transition(&mut inner, GateState::Ready),
            SupportState::Unsupported(reason) => {
                tracing::warn!(%reason, "Enrollment blocked");
                transition(&mut inner, GateState::Blocked { reason: reason.clone() });
                self.emit(GateEvent::Failed(reason.clone()));
            }
            SupportState::Unknown => {}
        }
        support
    }

    /// Start an enrollment. Must only be called in response to an explicit
    /// user action; it may raise an OS-level prompt.
    pub async fn enroll(&self) -> EnrollOutcome {
        if let Err(rejected) = self.begin() {
            tracing::debug!(%rejected, "Enrollment not started");
            return EnrollOutcome::Rejected(rejected);
        }
        tracing::info!("Enrollment started");

        let result = self.run_ceremony().await;
        self.finish(result)
    }

    /// Detach from the host. Results still in flight are dropped.
    pub fn teardown(&self) {
        let _inner = self.lock();
        self.torn_down.store(true, Ordering::SeqCst);
        tracing::debug!("Gate torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), StartRejected> {
        let mut inner = self.lock();
        if self.is_torn_down() {
            return Err(StartRejected::TornDown);
        }
        match inner.state {
            GateState::Ready | GateState::Failed { .. } => {
                transition(&mut inner, GateState::Enrolling);
                Ok(())
            }
            GateState::Enrolling => Err(StartRejected::InProgress),
            GateState::Succeeded => Err(StartRejected::AlreadyEnrolled),
            GateState::Blocked { .. } => Err(StartRejected::Blocked),
            GateState::Idle | GateState::CheckingSupport => Err(StartRejected::NotReady),
        }
    }

    fn finish(&self, result: Result<(), GateError>) -> EnrollOutcome {
        let mut inner = self.lock();
        if self.is_torn_down() || result == Err(GateError::Aborted) {
            tracing::debug!("Ceremony result arrived after teardown, dropped");
            return EnrollOutcome::Discarded;
        }
        match result {
            Ok(()) => {
                tracing::info!("Enrollment verified");
                transition(&mut inner, GateState::Succeeded);
                self.emit(GateEvent::Passed);
                EnrollOutcome::Passed
            }
            Err(e) => {
                let diagnostic = e.diagnostic();
                tracing::warn!(%diagnostic, "Enrollment failed");
                transition(&mut inner, GateState::Failed { diagnostic: diagnostic.clone() });
                self.emit(GateEvent::Failed(diagnostic));
                EnrollOutcome::Failed(e)
            }
        }
    }

    async fn run_ceremony(&self) -> Result<(), GateError> {
        let platform = self
            .platform
            .as_deref()
            .ok_or_else(|| GateError::EnvironmentUnsupported(NO_PLATFORM_API.to_string()))?;

        // 1. Fresh options on every attempt
        let options = self.client.fetch_options().await?;
        self.ensure_live()?;

        // 2. Decode binary fields
        let options = material::decode_options(options)?;
        tracing::debug!(
            challenge_len = options.challenge.len(),
            user_id_len = options.user.id.len(),
            "Options decoded"
        );

        // 3. Platform ceremony
        let credential = self.create_credential(platform, options).await?;
        self.ensure_live()?;
        tracing::debug!(cred_id = %credential.id, "Platform ceremony completed");

        // 4. Encode and 5. submit
        let payload = material::encode_credential(&credential);
        let outcome = self.client.submit_result(&payload).await?;
        self.ensure_live()?;

        // 6. Only an explicit ok passes
        if outcome.success {
            Ok(())
        } else {
            Err(GateError::VerificationRejected(
                outcome.diagnostic.unwrap_or_else(|| VERIFICATION_FAILED.to_string()),
            ))
        }
    }

    async fn create_credential(
        &self,
        platform: &dyn PlatformCredentials,
        options: CreationOptions,
    ) -> Result<PublicKeyCredential, PlatformError> {
        match self.ceremony_timeout {
            Some(limit) => tokio::time::timeout(limit, platform.create(options))
                .await
                .map_err(|_| PlatformError::Timeout)?,
            None => platform.create(options).await,
        }
    }

    fn ensure_live(&self) -> Result<(), GateError> {
        if self.is_torn_down() {
            return Err(GateError::Aborted);
        }
        Ok(())
    }

    fn emit(&self, event: GateEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("No listener for gate events");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn transition(inner: &mut Inner, next: GateState) {
    tracing::debug!(from = inner.state.name(), to = next.name(), "Gate transition");
    inner.state = next;
}
