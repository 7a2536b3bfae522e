//! # Lockbox Crypto
//!
//! Application-level envelope encryption with pluggable, algorithm-agnostic
//! providers, embedded metadata for self-describing ciphertexts, key-rotation
//! support, and context-bound authentication.
//!
//! ## Design Principles
//!
//! - **Modular Architecture**: The provider capability is a trait separated
//!   from its implementations, so additional algorithms register with the
//!   service without modifying it.
//! - **Self-Describing Ciphertexts**: Every encrypted value is wrapped in a
//!   `{algorithm, version, data}` metadata envelope; decryption auto-detects
//!   the provider from the envelope, no external hint required.
//! - **Zero-Downtime Key Rotation**: Keys are provisioned as one
//!   rotation-ordered, comma-separated list. The first entry encrypts; every
//!   entry is tried during decryption, so old ciphertexts keep working until
//!   their key is dropped from the list.
//! - **Unified Error Handling**: A single `CryptoError` enum covers the whole
//!   crate. Decryption failures are deliberately one undifferentiated kind —
//!   wrong key, wrong context and corrupted input are indistinguishable.
//! - **RustCrypto Only**: AES-256-GCM comes from the audited `aes-gcm` crate;
//!   raw key bytes are zeroized after cipher import.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use lockbox_crypto::{
//!     EncryptOptions, EncryptionService, JweA256GcmProvider, KeyMaterial,
//!     SupportedAlgorithm,
//! };
//!
//! # async fn example() -> Result<(), lockbox_crypto::CryptoError> {
//! // One comma-separated list of base64 256-bit keys; first entry encrypts.
//! let keys = KeyMaterial::from_secret_list(
//!     "kGkuCiDxyFJcDocCV0J3+cnyZLPCUg2PT9PBnANg2CA=",
//! )?;
//! let service = EncryptionService::new(vec![Arc::new(
//!     JweA256GcmProvider::new(keys),
//! )])?;
//!
//! let options = EncryptOptions::new(SupportedAlgorithm::JweA256Gcm)
//!     .with_context("user:123");
//! let envelope = service.encrypt("Hello, World!", &options).await?;
//!
//! // The envelope is self-describing: no algorithm hint on decrypt.
//! let plaintext = service
//!     .decrypt(
//!         &envelope,
//!         Some(&lockbox_crypto::DecryptOptions::with_context("user:123")),
//!     )
//!     .await?;
//! assert_eq!(plaintext, "Hello, World!");
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod envelope;
pub mod error;
pub mod provider;
pub mod provider_trait;
pub mod service;
pub mod shared;

pub use algorithm::SupportedAlgorithm;
pub use envelope::{ENVELOPE_VERSION, EncryptedMetadata, algorithm_from_encrypted};
pub use error::CryptoError;
pub use provider::{ENCRYPTION_KEYS_ENV, JweA256GcmProvider, KeyMaterial, SECRET_LEN};
pub use provider_trait::EncryptionProvider;
pub use service::{DecryptOptions, EncryptOptions, EncryptionService, MAX_PLAINTEXT_BYTES};
pub use shared::{reset_shared_service, shared_service};
