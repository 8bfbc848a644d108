//! Credential encryption using AES-256-GCM.
//!
//! service_auth_credentials rows are stored as versioned ciphertext
//! (version byte, nonce, ciphertext+tag) with the credential type bound in
//! as additional authenticated data, so a ciphertext cannot be replayed
//! under a different type.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION_ENCRYPTED: u8 = 0x01;
const VERSION_FIELD_LEN: usize = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_ENCRYPTED_LEN: usize = VERSION_FIELD_LEN + NONCE_LEN + TAG_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("invalid ciphertext format")]
    InvalidFormat,
    #[error("empty ciphertext")]
    EmptyCiphertext,
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Secure wrapper for encryption keys with zeroization
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ZeroizingKey(Vec<u8>);

/// Type alias for crypto keys
pub type CryptoKey = ZeroizingKey;

impl CryptoKey {
    /// Create a new crypto key from bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKey(
                "invalid key length: expected 32 bytes".to_string(),
            ));
        }
        Ok(ZeroizingKey(bytes))
    }

    /// Parse a key from its 64-character hex form as configured.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("invalid hex: {}", e)))?;
        Self::new(bytes)
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Encrypt bytes using AES-256-GCM
pub fn encrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(VERSION_FIELD_LEN + NONCE_LEN + ciphertext.len());
    result.push(VERSION_ENCRYPTED);
    result.extend_from_slice(&nonce);
    result.append(&mut ciphertext);

    Ok(result)
}

/// Decrypt bytes using AES-256-GCM
pub fn decrypt_bytes(
    key: &CryptoKey,
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::EmptyCiphertext);
    }

    // Legacy plaintext payloads carry no version marker
    if ciphertext[0] != VERSION_ENCRYPTED {
        return Ok(ciphertext.to_vec());
    }

    if ciphertext.len() < MIN_ENCRYPTED_LEN {
        return Err(CryptoError::InvalidFormat);
    }

    let nonce = Nonce::from_slice(&ciphertext[VERSION_FIELD_LEN..VERSION_FIELD_LEN + NONCE_LEN]);
    let ct_and_tag = &ciphertext[VERSION_FIELD_LEN + NONCE_LEN..];

    let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
    let cipher = Aes256Gcm::new(cipher_key);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ct_and_tag,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Determine if a payload is using the encrypted format
pub fn is_encrypted_payload(ciphertext: &[u8]) -> bool {
    ciphertext.len() >= MIN_ENCRYPTED_LEN && ciphertext[0] == VERSION_ENCRYPTED
}

/// Encrypt a credential secret, binding the credential type as AAD.
pub fn encrypt_credential(
    key: &CryptoKey,
    credential_type: &str,
    secret: &str,
) -> Result<Vec<u8>, CryptoError> {
    encrypt_bytes(key, credential_type.as_bytes(), secret.as_bytes())
}

/// Decrypt a credential ciphertext stored for the given type.
pub fn decrypt_credential(
    key: &CryptoKey,
    credential_type: &str,
    ciphertext: &[u8],
) -> Result<String, CryptoError> {
    let plaintext = decrypt_bytes(key, credential_type.as_bytes(), ciphertext)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::DecryptionFailed(format!("invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CryptoKey {
        CryptoKey::new(vec![0u8; 32]).expect("valid test key")
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = test_key();
        let aad = b"GITHUB_PAT";
        let plaintext = b"ghp_sometoken";

        let encrypted = encrypt_bytes(&key, aad, plaintext).expect("encryption succeeds");
        let decrypted = decrypt_bytes(&key, aad, &encrypted).expect("decryption succeeds");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn different_aad_fails() {
        let key = test_key();
        let plaintext = b"ghp_sometoken";

        let encrypted =
            encrypt_credential(&key, "GITHUB_PAT", "ghp_sometoken").expect("encryption succeeds");
        let result = decrypt_credential(&key, "GITLAB_PAT", &encrypted);

        assert!(result.is_err());
        let _ = plaintext;
    }

    #[test]
    fn modified_ciphertext_fails() {
        let key = test_key();
        let aad = b"GITHUB_PAT";

        let mut encrypted = encrypt_bytes(&key, aad, b"secret").expect("encryption succeeds");
        encrypted[13] ^= 0x01;

        let result = decrypt_bytes(&key, aad, &encrypted);
        assert!(result.is_err());
    }

    #[test]
    fn nonce_uniqueness() {
        let key = test_key();
        let aad = b"GITHUB_PAT";

        let encrypted1 = encrypt_bytes(&key, aad, b"secret").expect("encryption succeeds");
        let encrypted2 = encrypt_bytes(&key, aad, b"secret").expect("encryption succeeds");

        assert_ne!(&encrypted1[1..13], &encrypted2[1..13]);
        assert_eq!(
            decrypt_bytes(&key, aad, &encrypted1).expect("decrypts"),
            b"secret"
        );
        assert_eq!(
            decrypt_bytes(&key, aad, &encrypted2).expect("decrypts"),
            b"secret"
        );
    }

    #[test]
    fn legacy_plaintext_passthrough() {
        let key = test_key();
        let legacy = b"legacy-token".to_vec(); // no version marker

        let result =
            decrypt_credential(&key, "GITHUB_PAT", &legacy).expect("legacy plaintext is returned");
        assert_eq!(result, "legacy-token");
        assert!(!is_encrypted_payload(&legacy));
    }

    #[test]
    fn key_from_hex_roundtrip() {
        let key = CryptoKey::from_hex(&"ab".repeat(32)).expect("valid hex key");
        assert_eq!(key.as_bytes().len(), 32);

        assert!(CryptoKey::from_hex("not-hex").is_err());
        assert!(CryptoKey::from_hex("abcd").is_err()); // wrong length
    }

    #[test]
    fn insufficient_ciphertext_length() {
        let key = test_key();
        let short = vec![VERSION_ENCRYPTED, 0x02];

        let result = decrypt_bytes(&key, b"GITHUB_PAT", &short);
        assert!(matches!(result, Err(CryptoError::InvalidFormat)));
    }
}
