use ciborium::value::Value;

use super::PlatformError;

/// Build a WebAuthn attestation object in the "none" format.
///
/// The software authenticator has no attestation key, so the statement is
/// empty and the relying party must treat the credential as unattested.
pub(crate) fn build_attestation_object(auth_data: &[u8]) -> Result<Vec<u8>, PlatformError> {
    let map = Value::Map(vec![
        (Value::Text("fmt".to_string()), Value::Text("none".to_string())),
        (Value::Text("attStmt".to_string()), Value::Map(vec![])),
        (Value::Text("authData".to_string()), Value::Bytes(auth_data.to_vec())),
    ]);
    let mut buf = Vec::new();
    ciborium::into_writer(&map, &mut buf).map_err(|e| PlatformError::Cbor(e.to_string()))?;
    Ok(buf)
}
