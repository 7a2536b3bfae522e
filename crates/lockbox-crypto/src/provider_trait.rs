use async_trait::async_trait;

use crate::algorithm::SupportedAlgorithm;
use crate::error::CryptoError;

/// Capability implemented by every encryption algorithm variant.
///
/// A provider performs raw encrypt/decrypt for one algorithm, owns its own
/// key material (including the key-rotation decrypt-fallback loop), and
/// binds an optional context string into the ciphertext. The service holds a
/// registry of these and dispatches by identifier, so new variants register
/// without modifying the service.
///
/// Implementations must be `Send + Sync`: the service is shared across
/// concurrent tasks and every call is independent and self-contained.
#[async_trait]
pub trait EncryptionProvider: Send + Sync {
    /// Identifier used for registry lookup and envelope metadata.
    fn algorithm(&self) -> SupportedAlgorithm;

    /// Encrypts a plaintext string, optionally binding `context` so that
    /// decryption fails unless the exact same context is supplied.
    ///
    /// An empty plaintext short-circuits to an empty result without invoking
    /// any cryptographic primitive.
    ///
    /// # Errors
    /// Returns `CryptoError::Encryption` on primitive failure and
    /// `CryptoError::Configuration` if key material cannot be loaded.
    async fn encrypt(&self, plaintext: &str, context: Option<&str>)
    -> Result<String, CryptoError>;

    /// Decrypts a raw ciphertext string produced by this provider, trying
    /// every key in the rotation window until one opens it and the bound
    /// context matches.
    ///
    /// An empty input short-circuits to an empty output.
    ///
    /// # Errors
    /// Returns the undifferentiated `CryptoError::Decryption` when the key
    /// list is exhausted, the context does not match, or the input is
    /// malformed.
    async fn decrypt(&self, ciphertext: &str, context: Option<&str>)
    -> Result<String, CryptoError>;
}
