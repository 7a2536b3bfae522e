/// Unified error type for all lockbox-crypto operations.
/// Every failure a caller can observe is one of these variants; nothing is
/// silently recovered, and there is no internal retry beyond the key-rotation
/// fallback loop inside decryption.
///
/// Security consideration: the `Decryption` variant is deliberately a single
/// undifferentiated kind. Wrong key, wrong context and corrupted ciphertext
/// all surface with the same display string so a ciphertext holder cannot use
/// the error as an oracle. A cause is attached only for structurally invalid
/// envelopes, where the public wire format already makes the failure class
/// obvious.
#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    /// The encryption secret source is missing, empty, or holds an invalid
    /// secret. Fatal to every encrypt/decrypt call until fixed.
    #[error("encryption configuration error: {0}")]
    Configuration(String),

    /// The service was constructed with an empty provider set.
    #[error("no encryption providers registered")]
    NoProvidersRegistered,

    /// The caller did not specify an algorithm on encrypt.
    #[error("no encryption algorithm specified; available algorithms: {available}")]
    NoAlgorithmSpecified { available: String },

    /// The requested (encrypt) or embedded (decrypt) algorithm identifier is
    /// not in the provider registry.
    #[error("unsupported encryption algorithm {algorithm:?}; available algorithms: {available}")]
    UnsupportedAlgorithm { algorithm: String, available: String },

    /// The plaintext exceeds the maximum accepted size. Raised at the service
    /// boundary before any cryptographic primitive runs.
    #[error("plaintext of {size} bytes exceeds the {limit} byte limit")]
    PlaintextTooLarge { size: usize, limit: usize },

    /// The underlying primitive rejected the input or failed internally
    /// during encryption. The cause and requested algorithm are preserved.
    #[error("encryption with algorithm {algorithm:?} failed")]
    Encryption {
        algorithm: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Decryption failed: malformed envelope, all rotated keys exhausted, or
    /// context mismatch. One kind for all of them, by design.
    #[error("decryption failed")]
    Decryption {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CryptoError {
    /// An undifferentiated decryption failure with no recorded cause.
    pub fn decryption() -> Self {
        Self::Decryption { source: None }
    }

    /// A decryption failure preserving the structural cause (used for
    /// malformed envelopes, where the failure class is not key-dependent).
    pub fn decryption_caused_by<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Decryption {
            source: Some(source.into()),
        }
    }

    /// True for the decryption-class failure kind.
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_display_is_constant() {
        let bare = CryptoError::decryption();
        let caused = CryptoError::decryption_caused_by("invalid base64");
        assert_eq!(bare.to_string(), caused.to_string());
        assert_eq!(bare.to_string(), "decryption failed");
    }

    #[test]
    fn decryption_cause_is_preserved() {
        let err = CryptoError::decryption_caused_by("invalid base64");
        let source = std::error::Error::source(&err).expect("cause retained");
        assert_eq!(source.to_string(), "invalid base64");
        assert!(std::error::Error::source(&CryptoError::decryption()).is_none());
    }

    #[test]
    fn unsupported_algorithm_names_the_identifier() {
        let err = CryptoError::UnsupportedAlgorithm {
            algorithm: "ROT13".to_string(),
            available: "JWE-A256GCM".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("ROT13"));
        assert!(message.contains("JWE-A256GCM"));
    }
}
