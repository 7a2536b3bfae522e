//! Stateless dispatch over an immutable provider registry.
//!
//! The service owns a mapping from algorithm identifier to exactly one
//! provider instance, wraps provider output in the metadata envelope, and
//! resolves the provider for decryption from the envelope itself — no
//! external algorithm hint is ever required.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::algorithm::SupportedAlgorithm;
use crate::envelope;
use crate::error::CryptoError;
use crate::provider_trait::EncryptionProvider;

/// Largest accepted plaintext: 10 MiB. Enforced at the service boundary,
/// before any provider dispatch or cryptographic primitive runs.
pub const MAX_PLAINTEXT_BYTES: usize = 10 * 1024 * 1024;

/// Options for [`EncryptionService::encrypt`].
#[derive(Clone, Debug, Default)]
pub struct EncryptOptions {
    /// Algorithm to encrypt with. Leaving this unset is reported as
    /// `NoAlgorithmSpecified`, listing the available algorithms.
    pub algorithm: Option<SupportedAlgorithm>,
    /// Opaque binding string (e.g. `user:123`) cryptographically bound to
    /// the ciphertext. Decryption must supply the exact same string.
    pub context: Option<String>,
}

impl EncryptOptions {
    /// Options for the given algorithm with no bound context.
    pub fn new(algorithm: SupportedAlgorithm) -> Self {
        Self {
            algorithm: Some(algorithm),
            context: None,
        }
    }

    /// Binds a context string.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Options for [`EncryptionService::decrypt`].
#[derive(Clone, Debug, Default)]
pub struct DecryptOptions {
    /// Context the ciphertext is expected to be bound to. Compared for exact
    /// string equality by the provider.
    pub context: Option<String>,
}

impl DecryptOptions {
    /// Options expecting the given bound context.
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }
}

/// Registry of encryption providers keyed by algorithm identifier.
///
/// The provider set is fixed at construction and immutable thereafter, which
/// is what makes every public method safely callable from concurrent tasks
/// without locking.
pub struct EncryptionService {
    providers: HashMap<SupportedAlgorithm, Arc<dyn EncryptionProvider>>,
    // Identifier order mirrors registration order (first occurrence wins the
    // position, last registration wins the instance).
    order: Vec<SupportedAlgorithm>,
}

impl EncryptionService {
    /// Builds the registry from a non-empty provider set.
    ///
    /// When two providers claim the same identifier the later registration
    /// replaces the earlier instance.
    ///
    /// # Errors
    /// Returns `CryptoError::NoProvidersRegistered` for an empty set.
    pub fn new(providers: Vec<Arc<dyn EncryptionProvider>>) -> Result<Self, CryptoError> {
        if providers.is_empty() {
            return Err(CryptoError::NoProvidersRegistered);
        }
        let mut registry: HashMap<SupportedAlgorithm, Arc<dyn EncryptionProvider>> =
            HashMap::with_capacity(providers.len());
        let mut order = Vec::with_capacity(providers.len());
        for provider in providers {
            let algorithm = provider.algorithm();
            if registry.insert(algorithm, provider).is_none() {
                order.push(algorithm);
            }
        }
        debug!(algorithms = order.len(), "Encryption service constructed");
        Ok(Self {
            providers: registry,
            order,
        })
    }

    /// All registered identifiers, in registration order.
    pub fn supported_algorithms(&self) -> Vec<SupportedAlgorithm> {
        self.order.clone()
    }

    /// Membership test against the registry.
    pub fn is_algorithm_supported(&self, algorithm: SupportedAlgorithm) -> bool {
        self.providers.contains_key(&algorithm)
    }

    /// Best-effort peek at the algorithm identifier embedded in an envelope.
    /// Returns `None` when the envelope cannot be parsed.
    pub fn algorithm_from_encrypted(&self, encrypted: &str) -> Option<String> {
        envelope::algorithm_from_encrypted(encrypted)
    }

    /// Encrypts a plaintext string and returns the encoded metadata
    /// envelope — the only format this service ever hands to callers.
    ///
    /// # Errors
    /// `NoAlgorithmSpecified` when the options carry no algorithm,
    /// `UnsupportedAlgorithm` for an unregistered one, `PlaintextTooLarge`
    /// above [`MAX_PLAINTEXT_BYTES`], and `Encryption` wrapping any
    /// provider-level failure with its cause and the requested algorithm.
    pub async fn encrypt(
        &self,
        plaintext: &str,
        options: &EncryptOptions,
    ) -> Result<String, CryptoError> {
        let Some(algorithm) = options.algorithm else {
            return Err(CryptoError::NoAlgorithmSpecified {
                available: self.available(),
            });
        };
        let provider = self.providers.get(&algorithm).ok_or_else(|| {
            CryptoError::UnsupportedAlgorithm {
                algorithm: algorithm.as_str().to_string(),
                available: self.available(),
            }
        })?;
        if plaintext.len() > MAX_PLAINTEXT_BYTES {
            return Err(CryptoError::PlaintextTooLarge {
                size: plaintext.len(),
                limit: MAX_PLAINTEXT_BYTES,
            });
        }

        let raw = provider
            .encrypt(plaintext, options.context.as_deref())
            .await
            .map_err(|err| match err {
                err @ (CryptoError::Configuration(_) | CryptoError::Encryption { .. }) => err,
                other => CryptoError::Encryption {
                    algorithm: algorithm.as_str().to_string(),
                    source: Box::new(other),
                },
            })?;
        envelope::encode(algorithm.as_str(), &raw).map_err(|err| CryptoError::Encryption {
            algorithm: algorithm.as_str().to_string(),
            source: Box::new(err),
        })
    }

    /// Decrypts an encoded metadata envelope, auto-detecting the provider
    /// from the embedded algorithm identifier.
    ///
    /// # Errors
    /// `UnsupportedAlgorithm` naming an embedded identifier with no
    /// registered provider; otherwise the undifferentiated `Decryption`
    /// failure (empty input, malformed envelope, exhausted keys, context
    /// mismatch). Configuration errors pass through untouched.
    pub async fn decrypt(
        &self,
        encrypted: &str,
        options: Option<&DecryptOptions>,
    ) -> Result<String, CryptoError> {
        if encrypted.is_empty() {
            return Err(CryptoError::decryption_caused_by("empty ciphertext"));
        }
        let metadata = envelope::decode(encrypted)?;
        let provider = SupportedAlgorithm::from_id(&metadata.algorithm)
            .and_then(|algorithm| self.providers.get(&algorithm))
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm {
                algorithm: metadata.algorithm.clone(),
                available: self.available(),
            })?;

        let context = options.and_then(|options| options.context.as_deref());
        provider
            .decrypt(&metadata.data, context)
            .await
            .map_err(|err| match err {
                err @ (CryptoError::Decryption { .. }
                | CryptoError::UnsupportedAlgorithm { .. }
                | CryptoError::Configuration(_)) => err,
                other => CryptoError::decryption_caused_by(other),
            })
    }

    /// Decrypts under `old_options` and re-encrypts the recovered plaintext
    /// under `new_options`. Used for algorithm migration and context
    /// rebinding.
    ///
    /// Sequential composition only: a failure at either step aborts the
    /// whole operation and propagates untouched, leaving the caller with
    /// neither a new envelope nor any side effect.
    pub async fn re_encrypt(
        &self,
        encrypted: &str,
        old_options: Option<&DecryptOptions>,
        new_options: &EncryptOptions,
    ) -> Result<String, CryptoError> {
        let plaintext = self.decrypt(encrypted, old_options).await?;
        self.encrypt(&plaintext, new_options).await
    }

    fn available(&self) -> String {
        self.order
            .iter()
            .map(|algorithm| algorithm.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("algorithms", &self.order)
            .finish()
    }
}
