//! Credential vault: salted password digests and authenticated encryption
//! of user secrets under a device-bound key.
//!
//! The symmetric key never leaves the device.  A [`KeyProvider`] hands it
//! out get-or-create style; the concrete secure-storage backend is a
//! platform concern behind that trait.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::constants::{NONCE_SIZE, SALT_SIZE};
use crate::error::CryptoError;

pub type SymmetricKey = [u8; 32];

pub fn generate_symmetric_key() -> SymmetricKey {
    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Fresh random salt, base64-encoded.  Unique per call.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    BASE64.encode(salt)
}

/// Deterministic salted digest: SHA-256 over `salt || password`, base64.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Recompute and compare in constant time.
pub fn verify_password(password: &str, digest: &str, salt: &str) -> bool {
    let computed = hash_password(password, salt);
    computed.as_bytes().ct_eq(digest.as_bytes()).into()
}

// BLAKE3 KDF with domain separation
pub fn derive_key(key: &SymmetricKey, context: &str) -> SymmetricKey {
    blake3::derive_key(context, key)
}

/// Hands out the device-bound symmetric key.  `device_key` is idempotent:
/// the key is created on first use and returned unchanged thereafter.
pub trait KeyProvider: Send + Sync {
    fn device_key(&self) -> Result<SymmetricKey, CryptoError>;
}

/// File-backed key provider: a hex-encoded 32-byte key in the local data
/// directory.  Stands in for a platform keystore.
pub struct FileKeyProvider {
    path: PathBuf,
}

impl FileKeyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyProvider for FileKeyProvider {
    fn device_key(&self) -> Result<SymmetricKey, CryptoError> {
        if self.path.exists() {
            let hex_str = std::fs::read_to_string(&self.path)
                .map_err(|e| CryptoError::KeyFile(e.to_string()))?;
            let bytes = hex::decode(hex_str.trim())
                .map_err(|_| CryptoError::KeyFile("corrupt key file".to_string()))?;
            if bytes.len() != 32 {
                return Err(CryptoError::InvalidKeyLength);
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);
            return Ok(key);
        }

        let key = generate_symmetric_key();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CryptoError::KeyFile(e.to_string()))?;
        }
        std::fs::write(&self.path, hex::encode(key))
            .map_err(|e| CryptoError::KeyFile(e.to_string()))?;
        Ok(key)
    }
}

/// Authenticated symmetric encryption (XChaCha20-Poly1305) keyed by the
/// device-bound key.  Ciphertext layout: 24-byte random nonce prepended
/// to the authenticated payload.
pub struct Vault {
    key: SymmetricKey,
}

impl Vault {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = XChaCha20Poly1305::new(&self.key.into());
        let nonce_bytes = generate_nonce();
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_SIZE {
            return Err(CryptoError::AuthenticationFailed);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let cipher = XChaCha20Poly1305::new(&self.key.into());
        let nonce = XNonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    /// Encrypt a UTF-8 string into a base64 blob suitable for a TEXT column.
    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(BASE64.encode(self.encrypt(plaintext.as_bytes())?))
    }

    /// Reverse of [`Vault::encrypt_str`].  Any malformed or tampered input
    /// fails authentication; the caller never sees garbage.
    pub fn decrypt_str(&self, blob: &str) -> Result<String, CryptoError> {
        let data = BASE64
            .decode(blob)
            .map_err(|_| CryptoError::AuthenticationFailed)?;
        let plaintext = self.decrypt(&data)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let vault = Vault::new(generate_symmetric_key());
        let plaintext = b"wandering far from home";

        let encrypted = vault.encrypt(plaintext).unwrap();
        let decrypted = vault.decrypt(&encrypted).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let vault1 = Vault::new(generate_symmetric_key());
        let vault2 = Vault::new(generate_symmetric_key());

        let encrypted = vault1.encrypt(b"secret").unwrap();
        assert!(matches!(
            vault2.decrypt(&encrypted),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let vault = Vault::new(generate_symmetric_key());

        let mut encrypted = vault.encrypt(b"important data").unwrap();
        let len = encrypted.len();
        encrypted[len - 1] ^= 0xFF;

        assert!(matches!(
            vault.decrypt(&encrypted),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_short_data_fails() {
        let vault = Vault::new(generate_symmetric_key());
        assert!(vault.decrypt(&[]).is_err());
        assert!(vault.decrypt(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_string_blob_roundtrip() {
        let vault = Vault::new(generate_symmetric_key());
        let blob = vault.encrypt_str("digest:salt").unwrap();
        assert_eq!(vault.decrypt_str(&blob).unwrap(), "digest:salt");

        assert!(vault.decrypt_str("not base64 at all!!!").is_err());
    }

    #[test]
    fn test_hash_deterministic_and_salted() {
        let salt = generate_salt();
        assert_eq!(hash_password("pw", &salt), hash_password("pw", &salt));

        let other_salt = generate_salt();
        assert_ne!(salt, other_salt);
        assert_ne!(hash_password("pw", &salt), hash_password("pw", &other_salt));
    }

    #[test]
    fn test_verify_password() {
        let salt = generate_salt();
        let digest = hash_password("pw", &salt);

        assert!(verify_password("pw", &digest, &salt));
        assert!(!verify_password("wrong", &digest, &salt));
    }

    #[test]
    fn test_file_provider_get_or_create() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileKeyProvider::new(dir.path().join("device.key"));

        let first = provider.device_key().unwrap();
        let second = provider.device_key().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_derive_key_domain_separation() {
        let key = generate_symmetric_key();
        assert_eq!(derive_key(&key, "ctx-a"), derive_key(&key, "ctx-a"));
        assert_ne!(derive_key(&key, "ctx-a"), derive_key(&key, "ctx-b"));
    }
}
