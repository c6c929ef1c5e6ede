mod common;

use ciborium::value::Value as Cbor;
use common::ScriptedVerifier;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use fingergate::platform::uv::UvError;
use fingergate::platform::{
    CreationOptions, PlatformCredentials, PlatformError, RequestOptions, SoftAuthenticator,
    UserEntity,
};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

const ORIGIN: &str = "http://localhost:3000";

fn creation_options(parameters: Value) -> CreationOptions {
    let Value::Object(parameters) = parameters else { panic!("not an object") };
    let Value::Object(attributes) = json!({ "name": "12345678", "displayName": "Alice" }) else {
        unreachable!()
    };
    CreationOptions {
        challenge: b"abc".to_vec(),
        user: UserEntity { id: vec![0x78], attributes },
        parameters,
    }
}

fn cbor_map(bytes: &[u8]) -> Vec<(Cbor, Cbor)> {
    let value: Cbor = ciborium::from_reader(bytes).unwrap();
    let Cbor::Map(map) = value else { panic!("not a CBOR map") };
    map
}

fn auth_data_of(attestation_object: &[u8]) -> Vec<u8> {
    cbor_map(attestation_object)
        .into_iter()
        .find_map(|(k, v)| match (k, v) {
            (Cbor::Text(k), Cbor::Bytes(b)) if k == "authData" => Some(b),
            _ => None,
        })
        .expect("authData present")
}

/// Credential id and Ed25519 public key from creation authenticator data.
fn attested_credential(auth_data: &[u8]) -> (Vec<u8>, [u8; 32]) {
    let id_len = u16::from_be_bytes([auth_data[53], auth_data[54]]) as usize;
    let id = auth_data[55..55 + id_len].to_vec();
    let cose = cbor_map(&auth_data[55 + id_len..]);
    let x = cose
        .into_iter()
        .find_map(|(k, v)| match (k, v) {
            (Cbor::Integer(k), Cbor::Bytes(b)) if i128::from(k) == -2 => Some(b),
            _ => None,
        })
        .expect("COSE x coordinate");
    (id, x.try_into().unwrap())
}

#[tokio::test]
async fn test_availability_follows_verifier() {
    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::approving());
    assert_eq!(soft.is_user_verifying_platform_authenticator_available().await, Ok(true));

    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::unavailable());
    assert_eq!(soft.is_user_verifying_platform_authenticator_available().await, Ok(false));
}

#[tokio::test]
async fn test_create_produces_none_attestation() {
    let verifier = ScriptedVerifier::approving();
    let soft = SoftAuthenticator::new(ORIGIN, verifier.clone());

    let credential = soft
        .create(creation_options(json!({
            "rp": { "id": "localhost", "name": "Tasks" },
            "pubKeyCredParams": [{ "type": "public-key", "alg": -8 }],
        })))
        .await
        .unwrap();

    assert_eq!(credential.kind, "public-key");
    assert_eq!(credential.raw_id.len(), 32);
    assert_eq!(credential.id, fingergate::codec::encode(&credential.raw_id));
    assert_eq!(verifier.prompt_count(), 1);
    assert!(verifier.prompts.lock().unwrap()[0].contains("Tasks (localhost)"));

    let client_data: Value = serde_json::from_slice(&credential.response.client_data_json).unwrap();
    assert_eq!(client_data["type"], "webauthn.create");
    assert_eq!(client_data["challenge"], "YWJj");
    assert_eq!(client_data["origin"], ORIGIN);

    let auth_data = auth_data_of(&credential.response.attestation_object);
    assert_eq!(&auth_data[..32], Sha256::digest(b"localhost").as_slice());
    assert_eq!(auth_data[32], 0x45, "UP | UV | AT");
    assert_eq!(&auth_data[33..37], &[0, 0, 0, 0]);
    let (id, _) = attested_credential(&auth_data);
    assert_eq!(id, credential.raw_id);
    assert_eq!(soft.credential_count(), 1);
}

#[tokio::test]
async fn test_create_falls_back_to_origin_host() {
    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::approving());
    let credential = soft.create(creation_options(json!({}))).await.unwrap();

    let auth_data = auth_data_of(&credential.response.attestation_object);
    assert_eq!(&auth_data[..32], Sha256::digest(b"localhost").as_slice());
}

#[tokio::test]
async fn test_create_requires_eddsa() {
    let verifier = ScriptedVerifier::approving();
    let soft = SoftAuthenticator::new(ORIGIN, verifier.clone());

    let err = soft
        .create(creation_options(json!({
            "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }, { "type": "public-key", "alg": -257 }],
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotSupported(_)));
    assert_eq!(verifier.prompt_count(), 0, "no prompt for an unusable request");
    assert_eq!(soft.credential_count(), 0);
}

#[tokio::test]
async fn test_create_denied_by_user() {
    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::answering(Err(UvError::Denied)));
    let err = soft.create(creation_options(json!({}))).await.unwrap_err();
    assert_eq!(err, PlatformError::NotAllowed("user denied verification".into()));
    assert_eq!(soft.credential_count(), 0);

    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::answering(Err(UvError::Timeout)));
    let err = soft.create(creation_options(json!({}))).await.unwrap_err();
    assert_eq!(err, PlatformError::Timeout);
}

#[tokio::test]
async fn test_get_signs_with_created_key() {
    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::approving());
    let created = soft
        .create(creation_options(json!({ "rp": { "id": "localhost" } })))
        .await
        .unwrap();
    let (_, public_key) = attested_credential(&auth_data_of(&created.response.attestation_object));
    let verifying_key = VerifyingKey::from_bytes(&public_key).unwrap();

    let request = RequestOptions {
        challenge: b"def".to_vec(),
        rp_id: Some("localhost".into()),
        allow_credentials: vec![created.raw_id.clone()],
        ..Default::default()
    };
    for expected_count in 1u32..=2 {
        let assertion = soft.get(request.clone()).await.unwrap();
        assert_eq!(assertion.raw_id, created.raw_id);
        assert_eq!(assertion.response.user_handle, Some(vec![0x78]));

        let auth_data = &assertion.response.authenticator_data;
        assert_eq!(auth_data.len(), 37);
        assert_eq!(auth_data[32], 0x05, "UP | UV");
        assert_eq!(u32::from_be_bytes(auth_data[33..37].try_into().unwrap()), expected_count);

        let client_data: Value =
            serde_json::from_slice(&assertion.response.client_data_json).unwrap();
        assert_eq!(client_data["type"], "webauthn.get");
        assert_eq!(client_data["challenge"], "ZGVm");

        let mut signed = auth_data.clone();
        signed.extend_from_slice(&Sha256::digest(&assertion.response.client_data_json));
        let signature = Signature::from_slice(&assertion.response.signature).unwrap();
        verifying_key.verify(&signed, &signature).unwrap();
    }
}

#[tokio::test]
async fn test_get_without_allow_list_uses_rp_credential() {
    let soft = SoftAuthenticator::new(ORIGIN, ScriptedVerifier::approving());
    let created = soft.create(creation_options(json!({}))).await.unwrap();

    let assertion = soft
        .get(RequestOptions { challenge: vec![1], ..Default::default() })
        .await
        .unwrap();
    assert_eq!(assertion.raw_id, created.raw_id);
}

#[tokio::test]
async fn test_get_without_matching_credential() {
    let verifier = ScriptedVerifier::approving();
    let soft = SoftAuthenticator::new(ORIGIN, verifier.clone());

    let err = soft.get(RequestOptions::default()).await.unwrap_err();
    assert_eq!(err, PlatformError::NoCredentials);

    let created = soft
        .create(creation_options(json!({ "rp": { "id": "localhost" } })))
        .await
        .unwrap();

    // right id, wrong relying party
    let err = soft
        .get(RequestOptions {
            rp_id: Some("tasks.example".into()),
            allow_credentials: vec![created.raw_id.clone()],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, PlatformError::NoCredentials);

    // unknown id
    let err = soft
        .get(RequestOptions { allow_credentials: vec![vec![7; 32]], ..Default::default() })
        .await
        .unwrap_err();
    assert_eq!(err, PlatformError::NoCredentials);
    assert_eq!(verifier.prompt_count(), 1, "only the creation prompted");
}
