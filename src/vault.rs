//! Credential vault: symmetric encryption of connection descriptors.
//!
//! Descriptors are serialized to JSON and sealed with AES-256-GCM under a
//! key derived from the owning user's id and a server-side secret salt.
//! The AEAD tag means decryption under the wrong key fails loudly instead
//! of yielding garbage that downstream JSON-parses incorrectly.
//!
//! Ciphertext layout: `base64(nonce(12) || ciphertext || tag)`.

use base64::Engine as _;
use base64::engine::general_purpose;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::engine::types::ConnectionDescriptor;
use crate::error::{GatewayError, GatewayResult};

const NONCE_LEN: usize = 12;

/// A per-user symmetric key. Derived, never stored.
#[derive(Clone)]
pub struct UserKey([u8; 32]);

impl UserKey {
    fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UserKey(<redacted>)")
    }
}

/// Encrypts and decrypts connection payloads. Pure transform, no side
/// effects, safe to share across requests.
pub struct CredentialVault {
    secret_salt: String,
    rng: SystemRandom,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").finish()
    }
}

impl CredentialVault {
    pub fn new(secret_salt: impl Into<String>) -> Self {
        Self {
            secret_salt: secret_salt.into(),
            rng: SystemRandom::new(),
        }
    }

    /// Derive the symmetric key for one user: `sha256(user_id || salt)`.
    ///
    /// Deterministic, so ciphertext survives process restarts, and
    /// user-scoped, so ciphertext produced for one user cannot be opened
    /// under another user's key.
    pub fn derive_key(&self, user_id: &Uuid) -> UserKey {
        let mut hasher = Sha256::new();
        hasher.update(user_id.to_string().as_bytes());
        hasher.update(self.secret_salt.as_bytes());
        UserKey(hasher.finalize().into())
    }

    /// Encrypt a descriptor under the given user key.
    pub fn encrypt(
        &self,
        descriptor: &ConnectionDescriptor,
        key: &UserKey,
    ) -> GatewayResult<String> {
        let plaintext = serde_json::to_vec(descriptor)
            .map_err(|e| GatewayError::Decryption(format!("descriptor serialization: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| GatewayError::Decryption("nonce generation failed".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes())
            .map_err(|_| GatewayError::Decryption("invalid encryption key".to_string()))?;
        let sealing = LessSafeKey::new(unbound);

        let mut buffer = plaintext;
        sealing
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut buffer)
            .map_err(|_| GatewayError::Decryption("encryption failed".to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(buffer);
        Ok(general_purpose::STANDARD.encode(combined))
    }

    /// Decrypt a payload under the given user key.
    ///
    /// Malformed ciphertext or a wrong key both surface as
    /// `GatewayError::Decryption`; the caller treats that as a
    /// tamper/authorization failure, not a transient error.
    pub fn decrypt(&self, ciphertext: &str, key: &UserKey) -> GatewayResult<ConnectionDescriptor> {
        let combined = general_purpose::STANDARD
            .decode(ciphertext)
            .map_err(|_| GatewayError::Decryption("payload is not valid base64".to_string()))?;

        if combined.len() < NONCE_LEN {
            return Err(GatewayError::Decryption("payload too short".to_string()));
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::assume_unique_for_key(
            nonce_bytes
                .try_into()
                .map_err(|_| GatewayError::Decryption("invalid nonce".to_string()))?,
        );

        let unbound = UnboundKey::new(&AES_256_GCM, key.as_bytes())
            .map_err(|_| GatewayError::Decryption("invalid decryption key".to_string()))?;
        let opening = LessSafeKey::new(unbound);

        let mut buffer = sealed.to_vec();
        let plaintext = opening
            .open_in_place(nonce, Aad::empty(), &mut buffer)
            .map_err(|_| GatewayError::Decryption("authentication failed".to_string()))?;

        serde_json::from_slice(plaintext)
            .map_err(|_| GatewayError::Decryption("payload is not a descriptor".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::EngineType;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::server(
            EngineType::PostgreSQL,
            "db1".to_string(),
            5432,
            "u".to_string(),
            "p".to_string(),
            "shop".to_string(),
        )
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let vault = CredentialVault::new("server-salt");
        let key = vault.derive_key(&Uuid::new_v4());

        let ciphertext = vault.encrypt(&descriptor(), &key).unwrap();
        let decrypted = vault.decrypt(&ciphertext, &key).unwrap();
        assert_eq!(decrypted, descriptor());
    }

    #[test]
    fn test_wrong_key_fails_loudly() {
        let vault = CredentialVault::new("server-salt");
        let key_a = vault.derive_key(&Uuid::new_v4());
        let key_b = vault.derive_key(&Uuid::new_v4());

        let ciphertext = vault.encrypt(&descriptor(), &key_a).unwrap();
        assert!(matches!(
            vault.decrypt(&ciphertext, &key_b),
            Err(GatewayError::Decryption(_))
        ));
    }

    #[test]
    fn test_same_user_different_salt_fails() {
        let user_id = Uuid::new_v4();
        let vault_a = CredentialVault::new("salt-a");
        let vault_b = CredentialVault::new("salt-b");

        let ciphertext = vault_a
            .encrypt(&descriptor(), &vault_a.derive_key(&user_id))
            .unwrap();
        assert!(vault_b
            .decrypt(&ciphertext, &vault_b.derive_key(&user_id))
            .is_err());
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let vault = CredentialVault::new("server-salt");
        let key = vault.derive_key(&Uuid::new_v4());
        let ciphertext = vault.encrypt(&descriptor(), &key).unwrap();

        let mut bytes = general_purpose::STANDARD.decode(&ciphertext).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = general_purpose::STANDARD.encode(bytes);

        assert!(matches!(
            vault.decrypt(&tampered, &key),
            Err(GatewayError::Decryption(_))
        ));
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let vault = CredentialVault::new("server-salt");
        let key = vault.derive_key(&Uuid::new_v4());
        assert!(vault.decrypt("not base64!!!", &key).is_err());
        assert!(vault.decrypt("AAAA", &key).is_err());
    }

    #[test]
    fn test_key_derivation_is_deterministic() {
        let vault = CredentialVault::new("server-salt");
        let user_id = Uuid::new_v4();
        let key_1 = vault.derive_key(&user_id);
        let key_2 = vault.derive_key(&user_id);
        assert_eq!(key_1.as_bytes(), key_2.as_bytes());
    }
}
