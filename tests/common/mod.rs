#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fingergate::client::{HttpTransport, Method, TransportError, TransportResponse, VerificationClient};
use fingergate::platform::uv::{UserVerified, UserVerifier, UvError, UvPrompt};
use fingergate::platform::{
    AssertionCredential, AttestationResponse, CreationOptions, PlatformCredentials, PlatformError,
    PublicKeyCredential, RequestOptions,
};
use fingergate::{GateEvent, Orchestrator};
use serde_json::Value;
use tokio::sync::{Notify, mpsc};

type Reply = Result<TransportResponse, TransportError>;

/// Transport answering from per-path scripts. The last scripted reply for a
/// path repeats once the queue is down to it.
#[derive(Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.push(path, Ok(TransportResponse { status, body }));
    }

    pub fn fail(&self, path: &str, error: TransportError) {
        self.push(path, Err(error));
    }

    fn push(&self, path: &str, reply: Reply) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(_, p, _)| p == path).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn bodies_to(&self, path: &str) -> Vec<Option<Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p, _)| p == path)
            .map(|(_, _, body)| body.clone())
            .collect()
    }

    pub fn methods_to(&self, path: &str) -> Vec<Method> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p, _)| p == path)
            .map(|(m, _, _)| *m)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((method, path.to_string(), body.cloned()));

        let mut scripts = self.scripts.lock().unwrap();
        let Some(queue) = scripts.get_mut(path) else {
            return Ok(TransportResponse { status: 404, body: Value::Null });
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

/// Platform with scripted availability and creation results.
pub struct FakePlatform {
    available: Result<bool, PlatformError>,
    outcomes: Mutex<VecDeque<Result<PublicKeyCredential, PlatformError>>>,
    seen: Mutex<Vec<CreationOptions>>,
    create_calls: AtomicUsize,
    hold: Mutex<bool>,
    entered: Notify,
    release: Notify,
}

impl FakePlatform {
    pub fn with_availability(available: Result<bool, PlatformError>) -> Arc<Self> {
        Arc::new(Self {
            available,
            outcomes: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
            create_calls: AtomicUsize::new(0),
            hold: Mutex::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn supported() -> Arc<Self> {
        Self::with_availability(Ok(true))
    }

    /// Queue the result of the next `create`. Without a queued result
    /// `create` returns [`sample_credential`].
    pub fn then(&self, outcome: Result<PublicKeyCredential, PlatformError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Make `create` wait for [`FakePlatform::release`].
    pub fn hold(&self) {
        *self.hold.lock().unwrap() = true;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Resolves once `create` has been entered.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<CreationOptions> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformCredentials for FakePlatform {
    async fn is_user_verifying_platform_authenticator_available(&self) -> Result<bool, PlatformError> {
        self.available.clone()
    }

    async fn create(&self, options: CreationOptions) -> Result<PublicKeyCredential, PlatformError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(options);
        self.entered.notify_one();

        let held = *self.hold.lock().unwrap();
        if held {
            self.release.notified().await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_credential()))
    }

    async fn get(&self, _options: RequestOptions) -> Result<AssertionCredential, PlatformError> {
        Err(PlatformError::NoCredentials)
    }
}

/// raw id `[1, 2, 3]`, client data `{}`, attestation object `{}` in CBOR.
pub fn sample_credential() -> PublicKeyCredential {
    PublicKeyCredential {
        id: "AQID".into(),
        raw_id: vec![1, 2, 3],
        kind: "public-key".into(),
        response: AttestationResponse {
            client_data_json: b"{}".to_vec(),
            attestation_object: vec![0xa0],
        },
    }
}

pub fn gate(
    platform: &Arc<FakePlatform>,
    transport: &Arc<FakeTransport>,
) -> (Orchestrator, mpsc::UnboundedReceiver<GateEvent>) {
    let platform: Arc<dyn PlatformCredentials> = platform.clone();
    Orchestrator::new(Some(platform), VerificationClient::new(transport.clone()))
}

/// Drain every event delivered so far.
pub fn drain(events: &mut mpsc::UnboundedReceiver<GateEvent>) -> Vec<GateEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Verifier that approves or denies without prompting.
pub struct ScriptedVerifier {
    pub available: Result<bool, UvError>,
    pub answer: Result<(), UvError>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedVerifier {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self { available: Ok(true), answer: Ok(()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn answering(answer: Result<(), UvError>) -> Arc<Self> {
        Arc::new(Self { available: Ok(true), answer, prompts: Mutex::new(Vec::new()) })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self { available: Ok(false), answer: Ok(()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl UserVerifier for ScriptedVerifier {
    async fn is_available(&self) -> Result<bool, UvError> {
        self.available.clone()
    }

    async fn verify(&self, prompt: &UvPrompt) -> Result<UserVerified, UvError> {
        self.prompts.lock().unwrap().push(prompt.description.clone());
        self.answer.clone().map(|()| UserVerified::test_only())
    }
}
