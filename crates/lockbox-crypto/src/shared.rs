//! Process-wide shared service instance.
//!
//! Most deployments construct one [`EncryptionService`] at startup and pass
//! it by handle; this module is the convenience variant for callers that
//! want a lazily-built singleton wired from environment configuration.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::CryptoError;
use crate::provider::JweA256GcmProvider;
use crate::service::EncryptionService;

static SHARED_SERVICE: RwLock<Option<Arc<EncryptionService>>> = RwLock::new(None);

/// Returns the process-wide service, constructing it on first use with the
/// default registry (the JWE-A256GCM provider, keyed from
/// `LOCKBOX_ENCRYPTION_KEYS`).
///
/// # Errors
/// Returns `CryptoError::Configuration` when the key environment variable is
/// unset or invalid; construction is retried on the next call.
pub fn shared_service() -> Result<Arc<EncryptionService>, CryptoError> {
    {
        let guard = SHARED_SERVICE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(service) = guard.as_ref() {
            return Ok(Arc::clone(service));
        }
    }

    let mut guard = SHARED_SERVICE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    // Another task may have won the race while we were upgrading the lock.
    if let Some(service) = guard.as_ref() {
        return Ok(Arc::clone(service));
    }
    let provider = JweA256GcmProvider::from_env()?;
    let service = Arc::new(EncryptionService::new(vec![Arc::new(provider)])?);
    *guard = Some(Arc::clone(&service));
    debug!("Shared encryption service constructed");
    Ok(service)
}

/// Clears the shared instance. Intended for test-harness setup only.
///
/// Tasks holding an `Arc` from a previous [`shared_service`] call keep
/// working against their stale instance; only new lookups see the fresh one.
/// That window is acceptable because the registry contents for a given
/// deployment are static.
pub fn reset_shared_service() {
    *SHARED_SERVICE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SupportedAlgorithm;
    use crate::provider::key_material::ENCRYPTION_KEYS_ENV;
    use crate::service::EncryptOptions;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serial_test::serial;

    fn set_random_key() {
        let secret = STANDARD.encode(rand::random::<[u8; 32]>());
        unsafe { std::env::set_var(ENCRYPTION_KEYS_ENV, secret) };
    }

    #[test]
    #[serial]
    fn shared_instance_is_memoized() {
        set_random_key();
        reset_shared_service();
        let first = shared_service().unwrap();
        let second = shared_service().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        reset_shared_service();
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
    }

    #[test]
    #[serial]
    fn reset_yields_a_fresh_instance() {
        set_random_key();
        reset_shared_service();
        let before = shared_service().unwrap();
        reset_shared_service();
        let after = shared_service().unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        // The stale handle keeps working.
        assert!(before.is_algorithm_supported(SupportedAlgorithm::JweA256Gcm));
        reset_shared_service();
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
    }

    #[test]
    #[serial]
    fn missing_configuration_fails_and_retries() {
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
        reset_shared_service();
        assert!(matches!(
            shared_service().unwrap_err(),
            CryptoError::Configuration(_)
        ));
        // A later call with configuration in place succeeds.
        set_random_key();
        assert!(shared_service().is_ok());
        reset_shared_service();
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
    }

    #[tokio::test]
    #[serial]
    async fn shared_instance_round_trips() {
        set_random_key();
        reset_shared_service();
        let service = shared_service().unwrap();
        let options = EncryptOptions::new(SupportedAlgorithm::JweA256Gcm);
        let envelope = service.encrypt("shared", &options).await.unwrap();
        assert_eq!(service.decrypt(&envelope, None).await.unwrap(), "shared");
        reset_shared_service();
        unsafe { std::env::remove_var(ENCRYPTION_KEYS_ENV) };
    }
}
