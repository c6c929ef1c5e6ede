pub(crate) mod attestation;
pub(crate) mod authenticator_data;
pub(crate) mod client_data;
pub mod soft;
pub(crate) mod store;
pub mod uv;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use soft::SoftAuthenticator;

/// COSE algorithm identifier for EdDSA.
pub const COSE_ALG_EDDSA: i64 = -8;

pub const PUBLIC_KEY_TYPE: &str = "public-key";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// The user cancelled or denied, or policy forbade the operation.
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("user verification timed out")]
    Timeout,
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("no matching credentials")]
    NoCredentials,
    #[error("cbor: {0}")]
    Cbor(String),
    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PlatformCredentials: Send + Sync {
    /// Whether a platform authenticator with user verification is present.
    async fn is_user_verifying_platform_authenticator_available(&self) -> Result<bool, PlatformError>;

    /// Run a credential creation ceremony.
    async fn create(&self, options: CreationOptions) -> Result<PublicKeyCredential, PlatformError>;

    /// Run an assertion ceremony against a previously created credential.
    async fn get(&self, options: RequestOptions) -> Result<AssertionCredential, PlatformError>;
}

/// Decoded creation options. Only `challenge` and `user.id` are binary; the
/// remaining server parameters pass through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationOptions {
    pub challenge: Vec<u8>,
    pub user: UserEntity,
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub attributes: Map<String, Value>,
}

impl UserEntity {
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.attributes.get("displayName").and_then(Value::as_str)
    }
}

impl CreationOptions {
    pub fn rp_id(&self) -> Option<&str> {
        self.parameters.get("rp")?.get("id")?.as_str()
    }

    pub fn rp_name(&self) -> Option<&str> {
        self.parameters.get("rp")?.get("name")?.as_str()
    }

    /// Algorithms listed in `pubKeyCredParams`, in server preference order.
    /// `None` when the server did not send the list.
    pub fn algorithms(&self) -> Option<Vec<i64>> {
        let params = self.parameters.get("pubKeyCredParams")?.as_array()?;
        Some(
            params
                .iter()
                .filter_map(|p| p.get("alg").and_then(Value::as_i64))
                .collect(),
        )
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.parameters
            .get("timeout")
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
    }
}

/// Output of a successful creation ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub kind: String,
    pub response: AttestationResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationResponse {
    pub client_data_json: Vec<u8>,
    pub attestation_object: Vec<u8>,
}

/// Decoded assertion request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub challenge: Vec<u8>,
    pub rp_id: Option<String>,
    pub allow_credentials: Vec<Vec<u8>>,
    pub user_verification: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub kind: String,
    pub response: AssertionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResponse {
    pub client_data_json: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}
