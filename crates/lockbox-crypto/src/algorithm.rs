/// Registered encryption algorithm identifiers.
/// A closed but extensible set: adding a member here and registering a
/// matching provider is all that is needed to support a new algorithm, the
/// service itself does not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SupportedAlgorithm {
    /// JWE-style direct AES-256-GCM (compact serialization, `alg: dir`,
    /// `enc: A256GCM`).
    JweA256Gcm,
}

impl SupportedAlgorithm {
    /// The identifier used for registry lookup and envelope metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JweA256Gcm => "JWE-A256GCM",
        }
    }

    /// Resolves an identifier string, e.g. one embedded in an envelope.
    /// Returns `None` for identifiers no registered member carries.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "JWE-A256GCM" => Some(Self::JweA256Gcm),
            _ => None,
        }
    }
}

impl std::fmt::Display for SupportedAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_round_trips() {
        let algorithm = SupportedAlgorithm::JweA256Gcm;
        assert_eq!(algorithm.as_str(), "JWE-A256GCM");
        assert_eq!(
            SupportedAlgorithm::from_id(algorithm.as_str()),
            Some(algorithm)
        );
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        assert_eq!(SupportedAlgorithm::from_id("ROT13"), None);
        assert_eq!(SupportedAlgorithm::from_id(""), None);
        // Identifiers are case-sensitive.
        assert_eq!(SupportedAlgorithm::from_id("jwe-a256gcm"), None);
    }
}
