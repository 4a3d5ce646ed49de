// At-rest encryption for stored provider API keys

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const NONCE_LEN: usize = 12;

/// Symmetric codec for API keys at rest. The cipher key is the SHA-256
/// digest of the process-wide secret; ciphertexts are url-safe base64 of
/// nonce || AES-256-GCM output.
#[derive(Clone)]
pub struct ApiKeyCodec {
    cipher: Aes256Gcm,
}

impl ApiKeyCodec {
    /// Derive the cipher from the configured secret. Callers must reject an
    /// empty secret at startup, before a codec is ever constructed.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt an API key. A fresh nonce is drawn per call, so two
    /// encryptions of the same plaintext do not compare equal.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| Error::Decryption("API key encryption failed".into()))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + sealed.len());
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decrypt a stored API key. An empty or malformed input, an
    /// authentication failure, or an empty decrypted result all fail hard;
    /// none of them is a valid "no credential" signal.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        if ciphertext.trim().is_empty() {
            return Err(Error::Decryption("encrypted API key is empty".into()));
        }

        let raw = URL_SAFE_NO_PAD
            .decode(ciphertext.trim())
            .map_err(|_| Error::Decryption("encrypted API key is not valid base64".into()))?;
        if raw.len() <= NONCE_LEN {
            return Err(Error::Decryption("encrypted API key is truncated".into()));
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| {
                Error::Decryption(
                    "decryption failed; the encryption key is incorrect or the value was \
                     encrypted with a different key"
                        .into(),
                )
            })?;

        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| Error::Decryption("decrypted API key is not valid UTF-8".into()))?;
        if plaintext.trim().is_empty() {
            return Err(Error::Decryption(
                "decryption resulted in an empty string".into(),
            ));
        }

        Ok(plaintext)
    }
}
