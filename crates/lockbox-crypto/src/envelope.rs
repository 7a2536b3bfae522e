//! Metadata envelope codec.
//!
//! Every ciphertext returned by the service is wrapped in a small JSON
//! document carrying the producing algorithm and a format version, then
//! base64-encoded into one opaque transportable string:
//!
//! ```text
//! base64( {"algorithm": "<identifier>", "version": 1, "data": "<ciphertext>"} )
//! ```
//!
//! The envelope makes ciphertexts self-describing: decryption needs no
//! external algorithm hint. The `data` field's internal structure belongs to
//! the matching provider and must not be interpreted by anything else.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Current envelope format version. Echoed on decode, reserved for forward
/// format evolution, not otherwise interpreted.
pub const ENVELOPE_VERSION: u32 = 1;

/// The decoded metadata envelope, the unit of interchange for all encrypted
/// values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMetadata {
    /// Identifier of the algorithm that produced `data`.
    pub algorithm: String,
    /// Envelope format version.
    pub version: u32,
    /// Provider-specific ciphertext string.
    pub data: String,
}

/// Wraps raw provider ciphertext into the encoded envelope string.
pub fn encode(algorithm: &str, data: &str) -> Result<String, serde_json::Error> {
    let metadata = EncryptedMetadata {
        algorithm: algorithm.to_string(),
        version: ENVELOPE_VERSION,
        data: data.to_string(),
    };
    let json = serde_json::to_vec(&metadata)?;
    Ok(STANDARD.encode(json))
}

/// Unwraps an encoded envelope string back into its metadata.
/// A failure at either step (malformed base64, invalid JSON, missing fields)
/// is reported as an undifferentiated decryption failure with the structural
/// cause preserved.
pub fn decode(encrypted: &str) -> Result<EncryptedMetadata, CryptoError> {
    let json = STANDARD
        .decode(encrypted)
        .map_err(CryptoError::decryption_caused_by)?;
    serde_json::from_slice(&json).map_err(CryptoError::decryption_caused_by)
}

/// Best-effort peek at the algorithm identifier embedded in an envelope.
/// Returns `None` when the envelope cannot be parsed. Used for
/// introspection; the decrypt path decodes fully itself.
pub fn algorithm_from_encrypted(encrypted: &str) -> Option<String> {
    decode(encrypted).ok().map(|metadata| metadata.algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn encode_decode_round_trip() {
        let encoded = encode("JWE-A256GCM", "header..iv.ct.tag").unwrap();
        let metadata = decode(&encoded).unwrap();
        assert_eq!(metadata.algorithm, "JWE-A256GCM");
        assert_eq!(metadata.version, ENVELOPE_VERSION);
        assert_eq!(metadata.data, "header..iv.ct.tag");
    }

    #[test]
    fn wire_format_is_base64_json() {
        let encoded = encode("JWE-A256GCM", "abc").unwrap();
        let json = STANDARD.decode(&encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["algorithm"], "JWE-A256GCM");
        assert_eq!(value["version"], 1);
        assert_eq!(value["data"], "abc");
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = decode("not base64!!!").unwrap_err();
        assert!(err.is_decryption());
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let encoded = STANDARD.encode(b"not json");
        let err = decode(&encoded).unwrap_err();
        assert!(err.is_decryption());
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let encoded = STANDARD.encode(br#"{"algorithm":"JWE-A256GCM"}"#);
        let err = decode(&encoded).unwrap_err();
        assert!(err.is_decryption());
    }

    #[test]
    fn peek_returns_embedded_algorithm() {
        let encoded = encode("JWE-A256GCM", "ciphertext").unwrap();
        assert_eq!(
            algorithm_from_encrypted(&encoded).as_deref(),
            Some("JWE-A256GCM")
        );
    }

    #[test]
    fn peek_is_none_for_garbage() {
        assert_eq!(algorithm_from_encrypted("definitely not an envelope"), None);
    }

    #[test]
    fn peek_preserves_unknown_identifiers() {
        let encoded = encode("ROT13", "ciphertext").unwrap();
        assert_eq!(algorithm_from_encrypted(&encoded).as_deref(), Some("ROT13"));
    }
}
