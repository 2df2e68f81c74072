//! # Credential Validator
//!
//! Stateless issue / validate / refresh over HS256 tokens. Keys are derived
//! once at construction; every call after that is pure CPU work with no
//! I/O and no shared mutable state, so the validator is shared as-is
//! across request tasks.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use carflow_core::{CredentialKind, Principal};

use crate::claims::{CredentialClaims, IdentityClaims, ISSUER};
use crate::error::{AuthError, AuthenticationError, CredentialError};
use crate::secret::CredentialSecret;

/// Default lifetime of an access credential.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
/// Default lifetime of a renewal credential.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Validator construction parameters.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Secret for access credentials.
    pub access_secret: CredentialSecret,
    /// Secret for renewal credentials.
    pub refresh_secret: CredentialSecret,
    /// Access credential lifetime.
    pub access_ttl: Duration,
    /// Renewal credential lifetime.
    pub refresh_ttl: Duration,
}

impl ValidatorConfig {
    /// Config with the default lifetimes.
    pub fn new(access_secret: CredentialSecret, refresh_secret: CredentialSecret) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }
}

/// A freshly signed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCredential {
    /// The encoded token.
    pub token: String,
    /// Expiry of the token.
    pub expires_at: DateTime<Utc>,
}

/// Access + renewal credential pair, as returned by a login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    /// Access credential.
    pub token: String,
    /// Renewal credential.
    pub refresh_token: String,
    /// Expiry of the access credential.
    pub expires_at: DateTime<Utc>,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

/// Issues and verifies CarFlow credentials.
pub struct CredentialValidator {
    access: KindKeys,
    refresh: KindKeys,
    validation: Validation,
}

impl std::fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialValidator")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialValidator {
    /// Build a validator.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::SharedSecret`] when both secrets are equal.
    /// - [`CredentialError::InvalidTtl`] when a lifetime is zero or out of range.
    pub fn new(config: ValidatorConfig) -> Result<Self, CredentialError> {
        if config.access_secret.ct_eq(&config.refresh_secret) {
            return Err(CredentialError::SharedSecret);
        }

        let access = KindKeys {
            encoding: EncodingKey::from_secret(config.access_secret.expose()),
            decoding: DecodingKey::from_secret(config.access_secret.expose()),
            ttl: ttl(config.access_ttl, "access")?,
        };
        let refresh = KindKeys {
            encoding: EncodingKey::from_secret(config.refresh_secret.expose()),
            decoding: DecodingKey::from_secret(config.refresh_secret.expose()),
            ttl: ttl(config.refresh_ttl, "refresh")?,
        };

        // Exactly HS256, zero leeway, nbf enforced, issuer pinned.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Ok(Self {
            access,
            refresh,
            validation,
        })
    }

    fn keys(&self, kind: CredentialKind) -> &KindKeys {
        match kind {
            CredentialKind::Access => &self.access,
            CredentialKind::Renewal => &self.refresh,
        }
    }

    /// Sign a credential of `kind` for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Signing`] if encoding fails.
    pub fn issue(
        &self,
        identity: &IdentityClaims,
        kind: CredentialKind,
    ) -> Result<IssuedCredential, CredentialError> {
        let now = Utc::now().timestamp();
        let exp = now + self.keys(kind).ttl.num_seconds();
        // Second precision, matching what the token carries.
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| CredentialError::Signing("expiry out of range".into()))?;
        let token = self.sign(&CredentialClaims::new(identity, kind, now, exp))?;
        Ok(IssuedCredential { token, expires_at })
    }

    /// Sign an access + renewal pair for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Signing`] if encoding fails.
    pub fn issue_pair(&self, identity: &IdentityClaims) -> Result<TokenPair, CredentialError> {
        let access = self.issue(identity, CredentialKind::Access)?;
        let renewal = self.issue(identity, CredentialKind::Renewal)?;
        Ok(TokenPair {
            token: access.token,
            refresh_token: renewal.token,
            expires_at: access.expires_at,
        })
    }

    /// Sign `claims` with the secret of `claims.kind`.
    pub(crate) fn sign(&self, claims: &CredentialClaims) -> Result<String, CredentialError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.keys(claims.kind).encoding,
        )
        .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    /// Verify `token` as a credential of `expected` kind.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthenticationError`] describing why the credential was
    /// refused. Callers must show only
    /// [`AuthenticationError::public_message`] to the end user.
    pub fn validate(
        &self,
        token: &str,
        expected: CredentialKind,
    ) -> Result<Principal, AuthenticationError> {
        if token.is_empty() {
            return Err(AuthenticationError::Missing);
        }

        let data = decode::<CredentialClaims>(token, &self.keys(expected).decoding, &self.validation)
            .map_err(AuthenticationError::from_jwt)?;
        let claims = data.claims;

        if claims.kind != expected {
            return Err(AuthenticationError::WrongKind {
                expected,
                found: claims.kind,
            });
        }
        if claims.sub != claims.user_id.as_str() {
            return Err(AuthenticationError::Malformed(
                "subject does not match user_id".into(),
            ));
        }
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthenticationError::Malformed("exp out of range".into()))?;

        Ok(Principal::new(
            claims.user_id,
            claims.email,
            claims.tenant_id,
            claims.role,
            claims.kind,
            expires_at,
        ))
    }

    /// Mint a fresh access credential from a renewal credential.
    ///
    /// The identity comes entirely from the renewal credential; the
    /// identity store is not consulted.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Authentication`] when the renewal credential is refused
    ///   (including when an access credential is presented).
    /// - [`AuthError::Credential`] when signing fails.
    pub fn refresh(&self, renewal: &str) -> Result<IssuedCredential, AuthError> {
        let principal = self.validate(renewal, CredentialKind::Renewal)?;
        Ok(self.issue(&IdentityClaims::from(&principal), CredentialKind::Access)?)
    }
}

fn ttl(d: Duration, name: &'static str) -> Result<chrono::Duration, CredentialError> {
    if d.is_zero() {
        return Err(CredentialError::InvalidTtl { name });
    }
    chrono::Duration::from_std(d).map_err(|_| CredentialError::InvalidTtl { name })
}
