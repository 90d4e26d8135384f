//! services/dashboard/src/adapters/cipher.rs
//!
//! Passphrase-based note encryption: Argon2id key derivation with a fresh salt
//! per payload, AES-256-GCM, and a base64 envelope of `salt ‖ nonce ‖ ciphertext`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use rand::RngCore;
use std::sync::Arc;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

// Argon2id cost: 19 MiB, 2 passes, 1 lane.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("Encryption failed")]
    Encryption,
    #[error("Decryption failed: wrong passphrase or corrupted payload")]
    Decryption,
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct NoteCipher {
    passphrase: Arc<str>,
}

impl std::fmt::Debug for NoteCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteCipher")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

impl NoteCipher {
    pub fn new(passphrase: impl Into<Arc<str>>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }

    fn derive_key(&self, salt: &[u8]) -> Result<[u8; KEY_LEN], CipherError> {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(KEY_LEN),
        )
        .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; KEY_LEN];
        argon2
            .hash_password_into(self.passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        Ok(key)
    }

    /// Encrypts `plaintext` into a base64 envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let salt: [u8; SALT_LEN] = random_bytes();
        let nonce: [u8; NONCE_LEN] = random_bytes();
        let key = self.derive_key(&salt)?;

        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::Encryption)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut envelope = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(envelope))
    }

    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(envelope.trim())
            .map_err(|e| CipherError::Malformed(e.to_string()))?;
        if bytes.len() <= SALT_LEN + NONCE_LEN {
            return Err(CipherError::Malformed(format!(
                "payload of {} bytes is too short",
                bytes.len()
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
        let key = self.derive_key(salt)?;

        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::Decryption)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decryption)?;
        String::from_utf8(plaintext).map_err(|e| CipherError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> NoteCipher {
        NoteCipher::new("correct horse battery staple")
    }

    #[test]
    fn test_round_trip() {
        let envelope = cipher().encrypt("meet at 10:00 ✓").unwrap();
        assert_ne!(envelope, "meet at 10:00 ✓");
        assert_eq!(cipher().decrypt(&envelope).unwrap(), "meet at 10:00 ✓");
    }

    #[test]
    fn test_salt_and_nonce_are_fresh() {
        let a = cipher().encrypt("same").unwrap();
        let b = cipher().encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_passphrase() {
        let envelope = cipher().encrypt("secret").unwrap();
        let other = NoteCipher::new("another long passphrase");
        assert_eq!(other.decrypt(&envelope), Err(CipherError::Decryption));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(cipher().decrypt("not base64!"), Err(CipherError::Malformed(_))));
        assert!(matches!(cipher().decrypt("AAAA"), Err(CipherError::Malformed(_))));
    }

    #[test]
    fn test_tampered_payload() {
        let envelope = cipher().encrypt("secret").unwrap();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(&envelope)
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = base64::engine::general_purpose::STANDARD.encode(bytes);
        assert_eq!(cipher().decrypt(&tampered), Err(CipherError::Decryption));
    }
}
