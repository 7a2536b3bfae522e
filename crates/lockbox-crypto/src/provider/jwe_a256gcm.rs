//! JWE-style direct AES-256-GCM provider.
//!
//! Ciphertexts use the compact JWE serialization (RFC 7516) with direct key
//! agreement, so the encrypted-key segment is empty:
//!
//! ```text
//! base64url(header)..base64url(iv).base64url(ciphertext).base64url(tag)
//! ```
//!
//! The protected header is `{"alg":"dir","enc":"A256GCM"}` plus an optional
//! `kid` field carrying the caller's context string. The base64url header is
//! the GCM additional authenticated data, which is what makes the context
//! binding real: a ciphertext holder cannot change or strip `kid` without
//! failing authentication.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::algorithm::SupportedAlgorithm;
use crate::error::CryptoError;
use crate::provider::key_material::KeyMaterial;
use crate::provider_trait::EncryptionProvider;

const HEADER_ALG: &str = "dir";
const HEADER_ENC: &str = "A256GCM";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Protected JWE header. Field order is the serialization order, and `kid`
/// is omitted entirely when no context is bound.
#[derive(Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
}

/// Direct AES-256-GCM provider with key-rotation decrypt fallback.
#[derive(Debug)]
pub struct JweA256GcmProvider {
    keys: KeyMaterial,
}

impl JweA256GcmProvider {
    /// Creates a provider over the given rotation-ordered key material.
    pub fn new(keys: KeyMaterial) -> Self {
        Self { keys }
    }

    /// Creates a provider from the `LOCKBOX_ENCRYPTION_KEYS` environment
    /// variable.
    ///
    /// # Errors
    /// Returns `CryptoError::Configuration` if the variable is unset or
    /// empty after parsing.
    pub fn from_env() -> Result<Self, CryptoError> {
        Ok(Self::new(KeyMaterial::from_env()?))
    }

    fn encryption_error(&self, message: &str) -> CryptoError {
        CryptoError::Encryption {
            algorithm: self.algorithm().as_str().to_string(),
            source: message.to_string().into(),
        }
    }

    /// Attempts to open one compact JWE under one key. `Ok(None)` means the
    /// key authenticated the ciphertext but the bound context did not match
    /// the caller's — callers must treat that exactly like a wrong key.
    fn try_open(
        cipher: &Aes256Gcm,
        header_b64: &str,
        header: &ProtectedHeader,
        nonce_bytes: &[u8],
        ciphertext_with_tag: &[u8],
        context: Option<&str>,
    ) -> Option<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext_with_tag,
                    aad: header_b64.as_bytes(),
                },
            )
            .ok()?;
        if header.kid.as_deref() != context {
            // Indistinguishable from a wrong-key failure by design: a
            // context mismatch must not leak which check failed.
            return None;
        }
        Some(plaintext)
    }
}

#[async_trait]
impl EncryptionProvider for JweA256GcmProvider {
    fn algorithm(&self) -> SupportedAlgorithm {
        SupportedAlgorithm::JweA256Gcm
    }

    async fn encrypt(
        &self,
        plaintext: &str,
        context: Option<&str>,
    ) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let header = ProtectedHeader {
            alg: HEADER_ALG.to_string(),
            enc: HEADER_ENC.to_string(),
            kid: context.map(str::to_string),
        };
        let header_json = serde_json::to_vec(&header)
            .map_err(|_| self.encryption_error("protected header serialization failed"))?;
        let header_b64 = URL_SAFE_NO_PAD.encode(header_json);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = self.keys.active_cipher()?;
        let ciphertext_with_tag = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: header_b64.as_bytes(),
                },
            )
            .map_err(|_| self.encryption_error("AEAD encryption failed"))?;

        let tag_offset = ciphertext_with_tag.len() - TAG_LEN;
        trace!(bytes = plaintext.len(), "Plaintext encrypted");
        Ok(format!(
            "{}..{}.{}.{}",
            header_b64,
            URL_SAFE_NO_PAD.encode(&nonce_bytes),
            URL_SAFE_NO_PAD.encode(&ciphertext_with_tag[..tag_offset]),
            URL_SAFE_NO_PAD.encode(&ciphertext_with_tag[tag_offset..]),
        ))
    }

    async fn decrypt(
        &self,
        ciphertext: &str,
        context: Option<&str>,
    ) -> Result<String, CryptoError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }

        // Compact JWE: header.encrypted_key.iv.ciphertext.tag, with an empty
        // encrypted-key segment for direct key agreement.
        let parts: Vec<&str> = ciphertext.split('.').collect();
        if parts.len() != 5 || !parts[1].is_empty() {
            return Err(CryptoError::decryption());
        }
        let header_b64 = parts[0];
        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| CryptoError::decryption())?;
        let header: ProtectedHeader =
            serde_json::from_slice(&header_json).map_err(|_| CryptoError::decryption())?;
        if header.alg != HEADER_ALG || header.enc != HEADER_ENC {
            return Err(CryptoError::decryption());
        }

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| CryptoError::decryption())?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CryptoError::decryption());
        }
        let mut ciphertext_with_tag = URL_SAFE_NO_PAD
            .decode(parts[3])
            .map_err(|_| CryptoError::decryption())?;
        let tag = URL_SAFE_NO_PAD
            .decode(parts[4])
            .map_err(|_| CryptoError::decryption())?;
        ciphertext_with_tag.extend_from_slice(&tag);

        // Rotation fallback: the active key is tried first, then every older
        // key still in the window. A context mismatch continues the loop the
        // same way a failed open does.
        for cipher in self.keys.all_ciphers()? {
            if let Some(plaintext) = Self::try_open(
                &cipher,
                header_b64,
                &header,
                &nonce_bytes,
                &ciphertext_with_tag,
                context,
            ) {
                trace!("Ciphertext opened");
                return String::from_utf8(plaintext).map_err(|_| CryptoError::decryption());
            }
        }
        Err(CryptoError::decryption())
    }
}
