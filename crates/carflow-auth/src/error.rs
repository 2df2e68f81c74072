//! # Credential Errors
//!
//! [`AuthenticationError`] covers every way a presented credential can be
//! refused. The variants exist for logs and metrics only: responses to the
//! caller always use [`AuthenticationError::public_message`] so the
//! failure mode is not an oracle.

use carflow_core::CredentialKind;
use thiserror::Error;

/// The generic message every authentication failure surfaces to callers.
pub const INVALID_CREDENTIAL: &str = "invalid credential";

/// A presented credential was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No credential, or not in `Bearer <credential>` form.
    #[error("credential missing or not a bearer credential")]
    Missing,

    /// Not a structurally valid token, or required claims are absent.
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// `exp` is in the past.
    #[error("credential expired")]
    Expired,

    /// `nbf` is in the future.
    #[error("credential not yet valid")]
    NotYetValid,

    /// Signature mismatch, unexpected algorithm, or foreign issuer.
    #[error("credential signature rejected")]
    BadSignature,

    /// Valid signature but the `type` claim names the other kind.
    #[error("credential kind mismatch: expected {expected}, found {found}")]
    WrongKind {
        /// Kind the caller asked for.
        expected: CredentialKind,
        /// Kind embedded in the credential.
        found: CredentialKind,
    },
}

impl AuthenticationError {
    /// Message safe to return to the caller. Identical for every variant.
    pub fn public_message(&self) -> &'static str {
        INVALID_CREDENTIAL
    }

    /// Short machine-readable reason for logs and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed(_) => "malformed",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
            Self::BadSignature => "bad_signature",
            Self::WrongKind { .. } => "wrong_kind",
        }
    }

    pub(crate) fn from_jwt(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidIssuer => Self::BadSignature,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Failure to construct a validator or to sign a credential.
///
/// These are deployment or programming problems, never caller mistakes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Secret shorter than the minimum length.
    #[error("{name} secret must be at least {min_len} bytes")]
    WeakSecret {
        /// Which secret (access or refresh).
        name: &'static str,
        /// Minimum accepted length in bytes.
        min_len: usize,
    },

    /// Access and refresh secrets are identical.
    #[error("access and refresh secrets must differ")]
    SharedSecret,

    /// A TTL is zero or does not fit the timestamp range.
    #[error("invalid {name} credential lifetime")]
    InvalidTtl {
        /// Which lifetime (access or refresh).
        name: &'static str,
    },

    /// Token encoding failed.
    #[error("credential signing failed: {0}")]
    Signing(String),
}

/// Top-level error for operations that both validate and issue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The presented credential was refused.
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// A new credential could not be produced.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_the_same_public_message() {
        let all = [
            AuthenticationError::Missing,
            AuthenticationError::Malformed("x".into()),
            AuthenticationError::Expired,
            AuthenticationError::NotYetValid,
            AuthenticationError::BadSignature,
            AuthenticationError::WrongKind {
                expected: CredentialKind::Access,
                found: CredentialKind::Renewal,
            },
        ];
        for err in &all {
            assert_eq!(err.public_message(), INVALID_CREDENTIAL);
        }
    }

    #[test]
    fn reasons_are_distinct() {
        let reasons = [
            AuthenticationError::Missing.reason(),
            AuthenticationError::Malformed(String::new()).reason(),
            AuthenticationError::Expired.reason(),
            AuthenticationError::NotYetValid.reason(),
            AuthenticationError::BadSignature.reason(),
            AuthenticationError::WrongKind {
                expected: CredentialKind::Access,
                found: CredentialKind::Renewal,
            }
            .reason(),
        ];
        let unique: std::collections::HashSet<_> = reasons.iter().collect();
        assert_eq!(unique.len(), reasons.len());
    }

    #[test]
    fn jwt_expired_maps_to_expired() {
        let err: jsonwebtoken::errors::Error =
            jsonwebtoken::errors::ErrorKind::ExpiredSignature.into();
        assert_eq!(AuthenticationError::from_jwt(err), AuthenticationError::Expired);
    }

    #[test]
    fn jwt_algorithm_mismatch_maps_to_bad_signature() {
        let err: jsonwebtoken::errors::Error =
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm.into();
        assert_eq!(
            AuthenticationError::from_jwt(err),
            AuthenticationError::BadSignature
        );
    }
}
