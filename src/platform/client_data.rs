use serde::Serialize;

use super::PlatformError;
use crate::codec;

pub(crate) const TYPE_CREATE: &str = "webauthn.create";
pub(crate) const TYPE_GET: &str = "webauthn.get";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectedClientData<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    challenge: String,
    origin: &'a str,
    cross_origin: bool,
}

/// Serialize the client data the relying party checks the challenge against.
pub(crate) fn build(kind: &str, challenge: &[u8], origin: &str) -> Result<Vec<u8>, PlatformError> {
    let data = CollectedClientData {
        kind,
        challenge: codec::encode(challenge),
        origin,
        cross_origin: false,
    };
    serde_json::to_vec(&data).map_err(|e| PlatformError::Unavailable(format!("client data: {e}")))
}
