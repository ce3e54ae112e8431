use anyhow::{anyhow, Result};

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a submitted account name.
    ///
    /// Names are picked from the store, so only a blank name is rejected;
    /// whether it matches an account is up to the credential check.
    pub fn validate_account_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Account name cannot be empty"));
        }

        Ok(())
    }

    /// Validate a submitted password before it is compared
    pub fn validate_password(password: &str) -> Result<()> {
        if password.chars().count() > 128 {
            return Err(anyhow!("Password too long (max 128 characters)"));
        }

        if password.contains('\0') {
            return Err(anyhow!("Password contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a SQL identifier that is interpolated into queries
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        let mut chars = identifier.chars();
        let Some(first) = chars.next() else {
            return Err(anyhow!("Identifier cannot be empty"));
        };

        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(anyhow!("Identifier must start with a letter or underscore"));
        }

        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow!(
                "Identifier may only contain ASCII letters, digits and underscores"
            ));
        }

        if identifier.len() > 64 {
            return Err(anyhow!("Identifier too long (max 64 characters)"));
        }

        Ok(())
    }

    /// Turn an account name into a string safe to use as a file name stem
    #[must_use]
    pub fn sanitize_file_stem(name: &str) -> String {
        let stem: String = name
            .trim()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        // Leading dots would hide the file or walk up a directory
        let stem = stem.trim_start_matches('.');
        if stem.is_empty() {
            "account".to_string()
        } else {
            stem.to_string()
        }
    }
}
