//! # Principal, Role and Credential Kind
//!
//! The authenticated identity that the admission pipeline hands to route
//! handlers. A [`Principal`] is only ever built from a credential that has
//! passed signature, temporal and kind checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{TenantId, UserId};

/// User permission level.
///
/// The `Ord` derivation follows declaration order, `User < Admin`, so
/// role checks are a single `>=` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standard tenant user.
    User,
    /// Administrator; may act across tenants.
    Admin,
}

impl Role {
    /// Wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

/// The two credential kinds.
///
/// Access credentials authorize API calls. Renewal credentials are only
/// good for minting a new access credential. They are signed with
/// different secrets and tagged so neither can stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    /// Short-lived credential presented on every API call.
    #[serde(rename = "access")]
    Access,
    /// Long-lived credential used only to mint access credentials.
    #[serde(rename = "refresh")]
    Renewal,
}

impl CredentialKind {
    /// Wire tag embedded in the credential's `type` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Renewal => "refresh",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Self::Access),
            "refresh" | "renewal" => Ok(Self::Renewal),
            other => Err(ValidationError::UnknownCredentialKind(other.to_string())),
        }
    }
}

/// Authenticated identity derived from a validated credential.
///
/// Fields are private; the value is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    email: String,
    tenant_id: TenantId,
    role: Role,
    kind: CredentialKind,
    expires_at: DateTime<Utc>,
}

impl Principal {
    /// Assemble a principal from validated parts.
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        tenant_id: TenantId,
        role: Role,
        kind: CredentialKind,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            tenant_id,
            role,
            kind,
            expires_at,
        }
    }

    /// The authenticated user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// The user's email as carried in the credential.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The tenant the user belongs to.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// The user's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Which kind of credential produced this principal.
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// When the underlying credential expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the principal holds at least `minimum`.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    /// Whether the principal may act on resources of `tenant`.
    ///
    /// Admins may act on any tenant; everyone else only on their own.
    pub fn can_access_tenant(&self, tenant: &TenantId) -> bool {
        self.role == Role::Admin || &self.tenant_id == tenant
    }
}
