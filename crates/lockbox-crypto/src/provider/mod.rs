pub mod jwe_a256gcm;
pub mod key_material;

pub use jwe_a256gcm::JweA256GcmProvider;
pub use key_material::{ENCRYPTION_KEYS_ENV, KeyMaterial, SECRET_LEN};
