use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::Rng;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use super::attestation::build_attestation_object;
use super::authenticator_data::{build_get_assertion_auth_data, build_make_cred_auth_data};
use super::client_data::{self, TYPE_CREATE, TYPE_GET};
use super::store::{CredentialStore, SoftCredential};
use super::uv::{UserVerifier, get_assertion_prompt, make_credential_prompt};
use super::{
    AssertionCredential, AssertionResponse, AttestationResponse, COSE_ALG_EDDSA, CreationOptions,
    PUBLIC_KEY_TYPE, PlatformCredentials, PlatformError, PublicKeyCredential, RequestOptions,
};
use crate::codec;

pub struct SoftAuthenticator {
    origin: String,
    verifier: Arc<dyn UserVerifier>,
    store: Mutex<CredentialStore>,
}

impl SoftAuthenticator {
    /// `origin` is reported in client data and supplies the RP id when the
    /// server omits one.
    pub fn new(origin: impl Into<String>, verifier: Arc<dyn UserVerifier>) -> Self {
        Self {
            origin: origin.into(),
            verifier,
            store: Mutex::new(CredentialStore::default()),
        }
    }

    pub fn credential_count(&self) -> usize {
        self.store().credential_count()
    }

    fn store(&self) -> MutexGuard<'_, CredentialStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Effective domain of an origin such as `https://app.example:8443`.
fn origin_host(origin: &str) -> &str {
    let rest = origin.split_once("://").map_or(origin, |(_, rest)| rest);
    rest.split(['/', ':']).next().unwrap_or(rest)
}

#[async_trait]
impl PlatformCredentials for SoftAuthenticator {
    async fn is_user_verifying_platform_authenticator_available(&self) -> Result<bool, PlatformError> {
        Ok(self.verifier.is_available().await?)
    }

    async fn create(&self, options: CreationOptions) -> Result<PublicKeyCredential, PlatformError> {
        // 1. Validate algorithm
        if let Some(algs) = options.algorithms() {
            if !algs.contains(&COSE_ALG_EDDSA) {
                return Err(PlatformError::NotSupported(format!(
                    "no requested algorithm is usable (offered {algs:?}, need EdDSA)"
                )));
            }
        }

        let rp_id = options
            .rp_id()
            .unwrap_or_else(|| origin_host(&self.origin))
            .to_string();
        let rp_id_hash: [u8; 32] = Sha256::digest(rp_id.as_bytes()).into();

        // 2. User verification
        let prompt = make_credential_prompt(
            &rp_id,
            options.rp_name(),
            options.user.display_name(),
            options.timeout(),
        );
        let _proof = self.verifier.verify(&prompt).await?;
        tracing::info!(rp_id = %rp_id, "User verification confirmed");

        // 3. Key material
        let signing_key = SigningKey::generate(&mut OsRng);
        let credential_id: [u8; 32] = rand::thread_rng().r#gen();

        // 4. authData, attestation object and client data
        let auth_data = build_make_cred_auth_data(
            &rp_id_hash,
            &credential_id,
            signing_key.verifying_key().as_bytes(),
        )?;
        let attestation_object = build_attestation_object(&auth_data)?;
        let client_data_json = client_data::build(TYPE_CREATE, &options.challenge, &self.origin)?;

        // 5. Keep the credential for later assertions
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let id = codec::encode(&credential_id);
        let user_display = options.user.display_name().map(str::to_string);
        self.store().add(SoftCredential {
            credential_id,
            rp_id_hash,
            user_id: options.user.id,
            user_display,
            signing_key,
            sign_count: 0,
            created_at,
        });
        tracing::info!(cred_id = %id, "Credential created");

        Ok(PublicKeyCredential {
            id,
            raw_id: credential_id.to_vec(),
            kind: PUBLIC_KEY_TYPE.to_string(),
            response: AttestationResponse {
                client_data_json,
                attestation_object,
            },
        })
    }

    async fn get(&self, options: RequestOptions) -> Result<AssertionCredential, PlatformError> {
        let rp_id = options
            .rp_id
            .clone()
            .unwrap_or_else(|| origin_host(&self.origin).to_string());
        let rp_id_hash: [u8; 32] = Sha256::digest(rp_id.as_bytes()).into();

        // Find credential
        let (credential_id, user_id, user_display) = {
            let store = self.store();
            let found = if options.allow_credentials.is_empty() {
                store.get_by_rp_hash(&rp_id_hash).into_iter().next()
            } else {
                options.allow_credentials.iter().find_map(|id| {
                    store.get_by_id(id).filter(|c| c.rp_id_hash == rp_id_hash)
                })
            };
            match found {
                Some(c) => (c.credential_id, c.user_id.clone(), c.user_display.clone()),
                None => return Err(PlatformError::NoCredentials),
            }
        };

        // User verification
        let prompt = get_assertion_prompt(&rp_id, user_display.as_deref(), options.timeout);
        let _proof = self.verifier.verify(&prompt).await?;
        tracing::info!(rp_id = %rp_id, "User verification confirmed");

        let client_data_json = client_data::build(TYPE_GET, &options.challenge, &self.origin)?;

        let (sign_count, signing_key) = {
            let mut store = self.store();
            let count = store
                .bump_sign_count(&credential_id)
                .ok_or(PlatformError::NoCredentials)?;
            let key = store
                .get_by_id(&credential_id)
                .map(|c| c.signing_key.clone())
                .ok_or(PlatformError::NoCredentials)?;
            (count, key)
        };
        tracing::debug!(count = sign_count, "Signature counter incremented");

        let authenticator_data = build_get_assertion_auth_data(&rp_id_hash, sign_count);
        let mut to_sign = authenticator_data.clone();
        to_sign.extend_from_slice(&Sha256::digest(&client_data_json));
        let signature = signing_key.sign(&to_sign);

        Ok(AssertionCredential {
            id: codec::encode(&credential_id),
            raw_id: credential_id.to_vec(),
            kind: PUBLIC_KEY_TYPE.to_string(),
            response: AssertionResponse {
                client_data_json,
                authenticator_data,
                signature: signature.to_bytes().to_vec(),
                user_handle: Some(user_id),
            },
        })
    }
}
