use std::collections::HashMap;

use ed25519_dalek::SigningKey;

pub(crate) struct SoftCredential {
    pub credential_id: [u8; 32],
    pub rp_id_hash: [u8; 32],
    pub user_id: Vec<u8>,
    pub user_display: Option<String>,
    pub signing_key: SigningKey,
    pub sign_count: u32,
    pub created_at: u64,
}

/// Credentials created by the software authenticator, kept for the process lifetime.
#[derive(Default)]
pub(crate) struct CredentialStore {
    by_id: HashMap<[u8; 32], SoftCredential>,
    by_rp: HashMap<[u8; 32], Vec<[u8; 32]>>,
}

impl CredentialStore {
    pub fn add(&mut self, credential: SoftCredential) {
        let id = credential.credential_id;
        self.by_rp.entry(credential.rp_id_hash).or_default().push(id);
        self.by_id.insert(id, credential);
    }

    /// Look up by credential id (for allow-list assertions).
    pub fn get_by_id(&self, id: &[u8]) -> Option<&SoftCredential> {
        let id: [u8; 32] = id.try_into().ok()?;
        self.by_id.get(&id)
    }

    /// All credentials for an rpIdHash, most recent first.
    pub fn get_by_rp_hash(&self, rp_id_hash: &[u8; 32]) -> Vec<&SoftCredential> {
        let Some(ids) = self.by_rp.get(rp_id_hash) else {
            return Vec::new();
        };
        let mut records: Vec<&SoftCredential> =
            ids.iter().filter_map(|id| self.by_id.get(id)).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Increment and return the signature counter of a credential.
    pub fn bump_sign_count(&mut self, id: &[u8; 32]) -> Option<u32> {
        let credential = self.by_id.get_mut(id)?;
        credential.sign_count = credential.sign_count.wrapping_add(1);
        Some(credential.sign_count)
    }

    pub fn credential_count(&self) -> usize {
        self.by_id.len()
    }
}
