//! Rotation-ordered key material for a provider instance.
//!
//! All secrets are provisioned through one configuration value: a
//! comma-separated list of base64-encoded 256-bit keys. The first entry is
//! the active key used for every new encryption; every entry remains valid
//! for decryption, which is what makes zero-downtime rotation work —
//! operators prepend the new key and drop the old one only after a grace
//! period.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use aes_gcm::{Aes256Gcm, KeyInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Environment variable holding the comma-separated secret list.
pub const ENCRYPTION_KEYS_ENV: &str = "LOCKBOX_ENCRYPTION_KEYS";

/// Required decoded length for every secret: 32 bytes, a 256-bit key.
pub const SECRET_LEN: usize = 32;

/// Key material manager embedded in each provider.
///
/// Cipher handles are memoized per raw secret string for the lifetime of the
/// owning provider. The cache is never evicted: the secret list cardinality
/// is small and operator-controlled, and re-deriving the same handle from
/// the same secret is convergent, so concurrent first-access races are
/// harmless.
pub struct KeyMaterial {
    secrets: Vec<String>,
    ciphers: RwLock<HashMap<String, Aes256Gcm>>,
}

impl KeyMaterial {
    /// Parses a comma-separated secret list: entries are trimmed, empty
    /// entries dropped.
    ///
    /// # Errors
    /// Returns `CryptoError::Configuration` if no entries remain.
    pub fn from_secret_list(list: &str) -> Result<Self, CryptoError> {
        let secrets: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
        if secrets.is_empty() {
            return Err(CryptoError::Configuration(
                "encryption secret list is empty".to_string(),
            ));
        }
        debug!(secrets = secrets.len(), "Key material loaded");
        Ok(Self {
            secrets,
            ciphers: RwLock::new(HashMap::new()),
        })
    }

    /// Loads the secret list from [`ENCRYPTION_KEYS_ENV`].
    ///
    /// # Errors
    /// Returns `CryptoError::Configuration` if the variable is unset or the
    /// parsed list is empty.
    pub fn from_env() -> Result<Self, CryptoError> {
        let list = std::env::var(ENCRYPTION_KEYS_ENV).map_err(|_| {
            CryptoError::Configuration(format!("{ENCRYPTION_KEYS_ENV} is not set"))
        })?;
        Self::from_secret_list(&list)
    }

    /// Number of secrets in the rotation window.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Always `false` for a constructed instance; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Returns the cipher handle for one raw secret, importing and caching
    /// it on first use.
    ///
    /// # Errors
    /// Returns `CryptoError::Configuration` if the secret is not valid
    /// base64 or does not decode to exactly [`SECRET_LEN`] bytes.
    pub fn cipher_for(&self, secret: &str) -> Result<Aes256Gcm, CryptoError> {
        {
            let cache = self
                .ciphers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(cipher) = cache.get(secret) {
                trace!("Cipher handle served from cache");
                return Ok(cipher.clone());
            }
        }

        let mut raw = STANDARD.decode(secret).map_err(|_| {
            CryptoError::Configuration("encryption secret is not valid base64".to_string())
        })?;
        if raw.len() != SECRET_LEN {
            raw.zeroize();
            return Err(CryptoError::Configuration(format!(
                "encryption secret must decode to {SECRET_LEN} bytes"
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(&raw).map_err(|_| {
            CryptoError::Configuration("encryption secret rejected by cipher".to_string())
        })?;
        raw.zeroize();
        debug!("Cipher handle imported");

        let mut cache = self
            .ciphers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        cache.insert(secret.to_string(), cipher.clone());
        Ok(cipher)
    }

    /// Cipher handle for the active (first) secret. Encryption always uses
    /// this one.
    pub fn active_cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        let secret = self.secrets.first().ok_or_else(|| {
            CryptoError::Configuration("encryption secret list is empty".to_string())
        })?;
        self.cipher_for(secret)
    }

    /// Cipher handles for every secret, in rotation order — the first entry
    /// is tried first during decryption.
    pub fn all_ciphers(&self) -> Result<Vec<Aes256Gcm>, CryptoError> {
        self.secrets
            .iter()
            .map(|secret| self.cipher_for(secret))
            .collect()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets are never printed.
        f.debug_struct("KeyMaterial")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use serial_test::serial;

    fn random_secret() -> String {
        STANDARD.encode(rand::random::<[u8; SECRET_LEN]>())
    }

    #[test]
    fn parses_and_trims_the_secret_list() {
        let a = random_secret();
        let b = random_secret();
        let material = KeyMaterial::from_secret_list(&format!(" {a} , {b} ,, ")).unwrap();
        assert_eq!(material.len(), 2);
    }

    #[test]
    fn empty_list_is_a_configuration_error() {
        for list in ["", "   ", ",,,", " , "] {
            let err = KeyMaterial::from_secret_list(list).unwrap_err();
            assert!(matches!(err, CryptoError::Configuration(_)), "{list:?}");
        }
    }

    #[test]
    fn rejects_secrets_of_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        let material = KeyMaterial::from_secret_list(&short).unwrap();
        let err = material.active_cipher().err().unwrap();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn rejects_secrets_that_are_not_base64() {
        let material = KeyMaterial::from_secret_list("!!! not base64 !!!").unwrap();
        let err = material.active_cipher().err().unwrap();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn active_cipher_is_the_first_entry() {
        let a = random_secret();
        let b = random_secret();
        let material = KeyMaterial::from_secret_list(&format!("{a},{b}")).unwrap();
        assert!(material.active_cipher().is_ok());
        assert_eq!(material.all_ciphers().unwrap().len(), 2);
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let secret = random_secret();
        let material = KeyMaterial::from_secret_list(&secret).unwrap();
        material.cipher_for(&secret).unwrap();
        material.cipher_for(&secret).unwrap();
        let cache = material.ciphers.read().unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    #[serial]
    fn from_env_reads_the_configured_variable() {
        let secret = random_secret();
        unsafe { std::env::set_var(ENCRYPTION_KEYS_ENV, &secret) };
        let material = KeyMaterial::from_env().unwrap();
        assert_eq!(material.len(), 1);
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
    }

    #[test]
    #[serial]
    fn from_env_fails_when_unset() {
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
        let err = KeyMaterial::from_env().unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }
}
