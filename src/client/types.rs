use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Registration options as issued by the server.
///
/// Only `challenge` and `user.id` are typed; everything else is carried
/// through verbatim in `parameters`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnrollmentOptions {
    pub challenge: String,
    pub user: UserOptions,
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserOptions {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Options arrive either under a `publicKey` key or bare. The shape is
/// settled before the inner value is parsed so field errors stay specific.
pub(crate) fn open_envelope<T: DeserializeOwned>(body: Value) -> Result<T, serde_json::Error> {
    let inner = match body {
        Value::Object(mut map) => match map.remove("publicKey") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        bare => bare,
    };
    serde_json::from_value(inner)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub success: bool,
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionOptions {
    pub challenge: String,
    pub rp_id: Option<String>,
    /// Milliseconds.
    pub timeout: Option<u64>,
    pub user_verification: Option<String>,
    #[serde(default)]
    pub allow_credentials: Vec<CredentialDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRequest {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}
