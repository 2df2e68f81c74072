//! # Signing Secrets
//!
//! Symmetric secrets for the two credential kinds. The bytes are zeroized
//! on drop and never printed.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::CredentialError;

/// Minimum accepted secret length in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// An HMAC signing secret.
///
/// Custom `Debug` redacts the value to prevent credential leakage in logs.
#[derive(Clone)]
pub struct CredentialSecret(Zeroizing<Vec<u8>>);

impl CredentialSecret {
    /// Wrap secret bytes, enforcing [`MIN_SECRET_LEN`].
    ///
    /// `name` labels the secret in the error ("access" or "refresh").
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::WeakSecret`] when the secret is too short.
    pub fn new(name: &'static str, bytes: impl Into<Vec<u8>>) -> Result<Self, CredentialError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.len() < MIN_SECRET_LEN {
            return Err(CredentialError::WeakSecret {
                name,
                min_len: MIN_SECRET_LEN,
            });
        }
        Ok(Self(bytes))
    }

    /// Raw secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Constant-time equality.
    ///
    /// A length mismatch returns early; only equal-length secrets are
    /// compared byte-for-byte.
    pub fn ct_eq(&self, other: &Self) -> bool {
        let (a, b) = (self.expose(), other.expose());
        if a.len() != b.len() {
            let _ = a.ct_eq(a);
            return false;
        }
        a.ct_eq(b).into()
    }
}

impl std::fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialSecret([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secret_rejected() {
        let err = CredentialSecret::new("access", "too-short").unwrap_err();
        assert_eq!(
            err,
            CredentialError::WeakSecret {
                name: "access",
                min_len: MIN_SECRET_LEN
            }
        );
    }

    #[test]
    fn debug_is_redacted() {
        let secret = CredentialSecret::new("access", "super-secret-value-123").unwrap();
        let printed = format!("{secret:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn ct_eq_matches_identical_and_rejects_others() {
        let a = CredentialSecret::new("access", "0123456789abcdef").unwrap();
        let b = CredentialSecret::new("refresh", "0123456789abcdef").unwrap();
        let c = CredentialSecret::new("refresh", "0123456789abcdeX").unwrap();
        let d = CredentialSecret::new("refresh", "0123456789abcdef0").unwrap();
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
        assert!(!a.ct_eq(&d));
    }
}
