use ciborium::value::Value;

use super::{COSE_ALG_EDDSA, PlatformError};

const FLAG_UP: u8 = 0x01;
const FLAG_UV: u8 = 0x04;
const FLAG_AT: u8 = 0x40;

/// Build authenticatorData for credential creation (UP, UV and AT set).
pub(crate) fn build_make_cred_auth_data(
    rp_id_hash: &[u8; 32],
    credential_id: &[u8],
    public_key: &[u8; 32],
) -> Result<Vec<u8>, PlatformError> {
    let cred_id_len = u16::try_from(credential_id.len()).map_err(|_| {
        PlatformError::NotSupported(format!("credential id of {} bytes", credential_id.len()))
    })?;
    let cose_key = encode_cose_key(public_key)?;
    let mut data = Vec::with_capacity(55 + credential_id.len() + cose_key.len());
    data.extend_from_slice(rp_id_hash);
    data.push(FLAG_UP | FLAG_UV | FLAG_AT);
    data.extend_from_slice(&[0, 0, 0, 0]); // signCount = 0
    data.extend_from_slice(&crate::config::AAGUID);
    data.extend_from_slice(&cred_id_len.to_be_bytes());
    data.extend_from_slice(credential_id);
    data.extend_from_slice(&cose_key);
    Ok(data)
}

/// Build authenticatorData for an assertion (UP and UV set, no credential data).
pub(crate) fn build_get_assertion_auth_data(rp_id_hash: &[u8; 32], sign_count: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(37);
    data.extend_from_slice(rp_id_hash);
    data.push(FLAG_UP | FLAG_UV);
    data.extend_from_slice(&sign_count.to_be_bytes());
    data
}

/// Encode an Ed25519 public key as a COSE_Key CBOR map (kty=1 OKP, alg=-8, crv=6, x).
pub(crate) fn encode_cose_key(public_key: &[u8; 32]) -> Result<Vec<u8>, PlatformError> {
    let map = Value::Map(vec![
        (Value::Integer(1i64.into()), Value::Integer(1i64.into())),
        (Value::Integer(3i64.into()), Value::Integer(COSE_ALG_EDDSA.into())),
        (Value::Integer((-1i64).into()), Value::Integer(6i64.into())),
        (Value::Integer((-2i64).into()), Value::Bytes(public_key.to_vec())),
    ]);
    let mut buf = Vec::new();
    ciborium::into_writer(&map, &mut buf).map_err(|e| PlatformError::Cbor(e.to_string()))?;
    Ok(buf)
}
