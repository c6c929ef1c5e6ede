pub mod transport;
pub mod types;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use transport::{
    AuthContext, HttpTransport, Method, ReqwestTransport, TransportError, TransportResponse,
};
pub use types::{
    AssertionOptions, AssertionRequest, CredentialDescriptor, EnrollmentOptions, UserOptions,
    VerificationOutcome, VerificationRequest,
};

use types::open_envelope;

pub const REGISTER_OPTIONS_PATH: &str = "webauthn/register/options/";
pub const REGISTER_VERIFY_PATH: &str = "webauthn/register/verify/";
pub const AUTHENTICATE_OPTIONS_PATH: &str = "webauthn/authenticate/options/";
pub const AUTHENTICATE_VERIFY_PATH: &str = "webauthn/authenticate/verify/";
pub const HEALTH_PATH: &str = "health/";

#[derive(Clone)]
pub struct VerificationClient {
    transport: Arc<dyn HttpTransport>,
}

impl VerificationClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Ask the server for registration options.
    pub async fn fetch_options(&self) -> Result<EnrollmentOptions, TransportError> {
        let response = self.call(Method::Post, REGISTER_OPTIONS_PATH, None).await?;
        unwrap_envelope(response.body)
    }

    /// Submit a registration result. `success` is true only when the server
    /// answered with an explicit `ok: true`.
    pub async fn submit_result(
        &self,
        payload: &VerificationRequest,
    ) -> Result<VerificationOutcome, TransportError> {
        let body = to_body(payload)?;
        let response = self.call(Method::Post, REGISTER_VERIFY_PATH, Some(&body)).await?;
        Ok(outcome(&response.body))
    }

    pub async fn fetch_assertion_options(&self) -> Result<AssertionOptions, TransportError> {
        let response = self.call(Method::Post, AUTHENTICATE_OPTIONS_PATH, None).await?;
        unwrap_envelope(response.body)
    }

    pub async fn submit_assertion(
        &self,
        payload: &AssertionRequest,
    ) -> Result<VerificationOutcome, TransportError> {
        let body = to_body(payload)?;
        let response = self.call(Method::Post, AUTHENTICATE_VERIFY_PATH, Some(&body)).await?;
        Ok(outcome(&response.body))
    }

    /// Health check. Only a 2xx answer from the health endpoint passes.
    pub async fn ping(&self) -> Result<(), TransportError> {
        self.call(Method::Get, HEALTH_PATH, None).await?;
        Ok(())
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse, TransportError> {
        let response = self.transport.send(method, path, body).await?;
        if !response.is_success() {
            let message = error_text(&response.body)
                .unwrap_or_else(|| format!("server returned HTTP {}", response.status));
            tracing::warn!(path, status = response.status, %message, "Request failed");
            return Err(TransportError::Server { status: response.status, message });
        }
        Ok(response)
    }
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, TransportError> {
    serde_json::to_value(payload).map_err(|e| TransportError::Malformed(e.to_string()))
}

fn unwrap_envelope<T: DeserializeOwned>(body: Value) -> Result<T, TransportError> {
    open_envelope(body).map_err(|e| TransportError::Malformed(format!("unexpected options shape: {e}")))
}

/// Server-supplied error text, if any.
fn error_text(body: &Value) -> Option<String> {
    ["error", "detail"]
        .into_iter()
        .find_map(|key| body.get(key)?.as_str())
        .map(str::to_string)
}

fn outcome(body: &Value) -> VerificationOutcome {
    VerificationOutcome {
        success: body.get("ok").and_then(Value::as_bool) == Some(true),
        diagnostic: error_text(body),
    }
}
