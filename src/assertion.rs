use std::time::Duration;

use crate::ceremony::VERIFICATION_FAILED;
use crate::ceremony::material::decode_field;
use crate::client::{AssertionOptions, AssertionRequest, VerificationClient};
use crate::codec;
use crate::error::{GateError, Result};
use crate::platform::{AssertionCredential, PlatformCredentials, RequestOptions};

/// Fetch assertion options, have the platform sign them, and submit the
/// result. Succeeds only on an explicit `ok: true`.
pub async fn authenticate(
    platform: &dyn PlatformCredentials,
    client: &VerificationClient,
) -> Result<()> {
    let options = client.fetch_assertion_options().await?;
    let request = decode_request(options)?;
    tracing::debug!(
        challenge_len = request.challenge.len(),
        allowed = request.allow_credentials.len(),
        "Assertion options decoded"
    );

    let assertion = platform.get(request).await?;
    tracing::debug!(cred_id = %assertion.id, "Platform assertion completed");

    let outcome = client.submit_assertion(&encode_assertion(&assertion)).await?;
    if outcome.success {
        tracing::info!("Assertion verified");
        Ok(())
    } else {
        Err(GateError::VerificationRejected(
            outcome.diagnostic.unwrap_or_else(|| VERIFICATION_FAILED.to_string()),
        ))
    }
}

fn decode_request(options: AssertionOptions) -> Result<RequestOptions> {
    let challenge = decode_field("challenge", &options.challenge)?;
    let allow_credentials = options
        .allow_credentials
        .iter()
        .map(|descriptor| decode_field("allowCredentials.id", &descriptor.id))
        .collect::<Result<Vec<_>>>()?;
    Ok(RequestOptions {
        challenge,
        rp_id: options.rp_id,
        allow_credentials,
        user_verification: options.user_verification,
        timeout: options.timeout.map(Duration::from_millis),
    })
}

fn encode_assertion(assertion: &AssertionCredential) -> AssertionRequest {
    AssertionRequest {
        id: assertion.id.clone(),
        raw_id: codec::encode(&assertion.raw_id),
        kind: assertion.kind.clone(),
        authenticator_data: codec::encode(&assertion.response.authenticator_data),
        client_data_json: codec::encode(&assertion.response.client_data_json),
        signature: codec::encode(&assertion.response.signature),
        user_handle: assertion.response.user_handle.as_deref().map(codec::encode),
    }
}
