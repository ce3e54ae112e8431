//! Account credential checks.
//!
//! [`DerivedPasswordVerifier`] is a placeholder: anyone who knows an account
//! name can compute its password. Deployments should plug a real credential
//! store in behind [`CredentialVerifier`].

use tracing::warn;

/// Suffix appended to the derived password
pub const PASSWORD_SUFFIX: &str = "@123";

/// Decides whether a password unlocks an account
pub trait CredentialVerifier: Send + Sync {
    /// True iff `password` is accepted for `name`
    fn verify(&self, name: &str, password: &str) -> bool;
}

/// Accepts the lowercased first three characters of the name followed by `@123`
#[derive(Debug, Clone, Copy)]
pub struct DerivedPasswordVerifier;

impl DerivedPasswordVerifier {
    /// Create the verifier, logging that the scheme is guessable
    #[must_use]
    pub fn new() -> Self {
        warn!("Using derived-password authentication; passwords are guessable from account names");
        Self
    }

    /// The password this scheme expects for `name`
    #[must_use]
    pub fn expected_password(name: &str) -> String {
        let prefix: String = name.chars().take(3).collect();
        format!("{}{PASSWORD_SUFFIX}", prefix.to_lowercase())
    }
}

impl Default for DerivedPasswordVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialVerifier for DerivedPasswordVerifier {
    fn verify(&self, name: &str, password: &str) -> bool {
        password == Self::expected_password(name)
    }
}

/// Verify with the derived-password scheme
#[must_use]
pub fn verify(name: &str, password: &str) -> bool {
    DerivedPasswordVerifier.verify(name, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_password_accepted() {
        assert!(verify("Acme", "acm@123"));
    }

    #[test]
    fn test_password_is_case_sensitive() {
        assert!(!verify("Acme", "ACM@123"));
        assert!(!verify("Acme", "Acm@123"));
    }

    #[test]
    fn test_short_names_are_not_padded() {
        assert!(verify("Ab", "ab@123"));
        assert!(verify("", "@123"));
        assert!(!verify("Ab", "ab @123"));
    }

    #[test]
    fn test_free_function_matches_verifier() {
        let verifier = DerivedPasswordVerifier;
        for (name, password) in [("Acme", "acm@123"), ("Acme", "ACM@123"), ("Ab", "ab@123"), ("", "")] {
            assert_eq!(verify(name, password), verifier.verify(name, password));
        }
    }

    #[test]
    fn test_multibyte_names_take_characters() {
        assert_eq!(DerivedPasswordVerifier::expected_password("Éclair"), "écl@123");
    }

    #[test]
    fn test_trait_object_verification() {
        let verifier: Box<dyn CredentialVerifier> = Box::new(DerivedPasswordVerifier::new());
        assert!(verifier.verify("Globex", "glo@123"));
        assert!(!verifier.verify("Globex", "wrong"));
    }
}
