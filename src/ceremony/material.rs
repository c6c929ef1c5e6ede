use crate::client::{EnrollmentOptions, VerificationRequest};
use crate::codec;
use crate::error::GateError;
use crate::platform::{CreationOptions, PublicKeyCredential, UserEntity};

pub(crate) fn decode_field(field: &'static str, text: &str) -> Result<Vec<u8>, GateError> {
    codec::decode(text).map_err(|source| GateError::Encoding { field, source })
}

/// Decode the two binary fields; everything else passes through untouched.
pub(crate) fn decode_options(options: EnrollmentOptions) -> Result<CreationOptions, GateError> {
    let challenge = decode_field("challenge", &options.challenge)?;
    let user_id = decode_field("user.id", &options.user.id)?;
    Ok(CreationOptions {
        challenge,
        user: UserEntity {
            id: user_id,
            attributes: options.user.attributes,
        },
        parameters: options.parameters,
    })
}

pub(crate) fn encode_credential(credential: &PublicKeyCredential) -> VerificationRequest {
    VerificationRequest {
        id: credential.id.clone(),
        raw_id: codec::encode(&credential.raw_id),
        kind: credential.kind.clone(),
        client_data_json: codec::encode(&credential.response.client_data_json),
        attestation_object: codec::encode(&credential.response.attestation_object),
    }
}
