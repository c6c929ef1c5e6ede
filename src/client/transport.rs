use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::{HTTP_TIMEOUT_SECS, USER_AGENT};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("session expired; sign in again")]
    SessionExpired,
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("network: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Bearer credentials handed to the transport at construction.
///
/// Invalidation is one-way: after a 401 the token is withheld from every
/// later request.
#[derive(Debug, Default)]
pub struct AuthContext {
    token: Option<String>,
    expired: AtomicBool,
}

impl AuthContext {
    pub fn new(token: Option<String>) -> Self {
        Self { token, expired: AtomicBool::new(false) }
    }

    pub fn token(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.token.as_deref()
    }

    pub fn invalidate(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when the body was empty or not JSON.
    pub body: Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `path` is relative to the transport's base URL.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse, TransportError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
    auth: std::sync::Arc<AuthContext>,
}

impl ReqwestTransport {
    pub fn new(
        base_url: impl Into<String>,
        auth: std::sync::Arc<AuthContext>,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { http, base_url: base_url.into(), auth })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.url(path);
        let mut request = match method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(?method, %url, "HTTP request");
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%url, "Server rejected bearer token, invalidating session");
            self.auth.invalidate();
            return Err(TransportError::SessionExpired);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::debug!(error = %e, len = bytes.len(), "Response body is not JSON");
                Value::Null
            })
        };
        tracing::debug!(status = status.as_u16(), "HTTP response");

        Ok(TransportResponse { status: status.as_u16(), body })
    }
}
