//! Email Value Object
//!
//! A validated email address carrying both the form the user submitted
//! (encrypted at rest for display) and the normalized form that feeds
//! the lookup hash. Normalization lowercases the address and strips a
//! `+` alias tag from the local part, so `user+tag@example.com` and
//! `User@example.com` resolve to the same identity hash.

use platform::hashing::hash_field;

use crate::error::{AuthError, AuthResult};

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Email address value object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// As submitted (trimmed), preserved for encryption/display
    original: String,
    /// Lowercased, alias-stripped form for hashing
    normalized: String,
}

impl Email {
    /// Create a new email with validation
    pub fn new(email: impl Into<String>) -> AuthResult<Self> {
        let original = email.into().trim().to_string();

        if original.is_empty() {
            return Err(AuthError::Validation("Email cannot be empty".to_string()));
        }

        if original.len() > EMAIL_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        let lowered = original.to_lowercase();
        if !Self::is_valid_format(&lowered) {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }

        Ok(Self {
            normalized: Self::normalize(&lowered),
            original,
        })
    }

    /// Lowercase and strip the `+` alias tag from the local part
    fn normalize(lowered: &str) -> String {
        match lowered.rsplit_once('@') {
            Some((local, domain)) if local.contains('+') => {
                let base = local.split('+').next().unwrap_or(local);
                format!("{base}@{domain}")
            }
            _ => lowered.to_string(),
        }
    }

    /// Basic email format validation
    fn is_valid_format(email: &str) -> bool {
        // Must contain exactly one @
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return false;
        }

        let local = parts[0];
        let domain = parts[1];

        // Local part checks
        if local.is_empty() || local.len() > 64 {
            return false;
        }

        // Domain checks
        if domain.is_empty() || !domain.contains('.') {
            return false;
        }

        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        // Domain shouldn't start or end with dot or hyphen
        if domain.starts_with('.') || domain.ends_with('.') {
            return false;
        }
        if domain.starts_with('-') || domain.ends_with('-') {
            return false;
        }

        true
    }

    /// The address as submitted (feeds field encryption)
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The normalized form (feeds the lookup hash)
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Application-namespaced lookup hash of the normalized form.
    ///
    /// Namespacing by application id prevents cross-tenant correlation
    /// of identical addresses.
    pub fn lookup_hash(&self, app_id: i64) -> String {
        hash_field(&self.normalized, &app_id.to_string())
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("User@Example.COM").is_ok());
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new("user@example").is_err());
    }

    #[test]
    fn test_normalization_case_folding() {
        let email = Email::new("User@Example.COM").unwrap();
        assert_eq!(email.normalized(), "user@example.com");
        // Original casing is preserved for encryption/display
        assert_eq!(email.original(), "User@Example.COM");
    }

    #[test]
    fn test_normalization_strips_alias_tag() {
        let tagged = Email::new("user+newsletter@example.com").unwrap();
        let plain = Email::new("user@example.com").unwrap();
        assert_eq!(tagged.normalized(), plain.normalized());

        // Multiple plus signs truncate at the first
        let multi = Email::new("user+a+b@example.com").unwrap();
        assert_eq!(multi.normalized(), "user@example.com");
    }

    #[test]
    fn test_normalization_idempotent() {
        let email = Email::new("User+tag@Example.com").unwrap();
        let renormalized = Email::new(email.normalized()).unwrap();
        assert_eq!(renormalized.normalized(), email.normalized());
    }

    #[test]
    fn test_lookup_hash_namespaced_by_app() {
        let email = Email::new("user@example.com").unwrap();
        assert_ne!(email.lookup_hash(1), email.lookup_hash(2));
        assert_eq!(email.lookup_hash(1), email.lookup_hash(1));
    }

    #[test]
    fn test_lookup_hash_equates_aliases() {
        let tagged = Email::new("User+promo@example.com").unwrap();
        let plain = Email::new("user@example.com").unwrap();
        assert_eq!(tagged.lookup_hash(7), plain.lookup_hash(7));
    }
}
