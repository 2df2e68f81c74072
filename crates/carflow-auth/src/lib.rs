#![deny(missing_docs)]

//! # carflow-auth: Credential Validator
//!
//! Issues and verifies the signed, time-bound credentials that every
//! protected CarFlow request carries.
//!
//! ## Credential Kinds
//!
//! | Kind      | Default TTL | Secret               | Used for                     |
//! |-----------|-------------|----------------------|------------------------------|
//! | access    | 15 minutes  | `JWT_ACCESS_SECRET`  | `Authorization: Bearer` calls |
//! | refresh   | 7 days      | `JWT_REFRESH_SECRET` | minting new access credentials |
//!
//! The two kinds are signed with distinct secrets *and* carry a `type`
//! claim, so a renewal credential is never accepted where an access
//! credential is expected and vice versa.
//!
//! ## Algorithm Pinning
//!
//! Verification accepts exactly HS256. Tokens declaring any other
//! algorithm, including `none` and asymmetric schemes, are rejected before
//! their claims are looked at.

pub mod claims;
pub mod error;
pub mod secret;
pub mod validator;

pub use claims::{CredentialClaims, IdentityClaims, ISSUER};
pub use error::{AuthError, AuthenticationError, CredentialError};
pub use secret::CredentialSecret;
pub use validator::{CredentialValidator, IssuedCredential, TokenPair, ValidatorConfig};
