//! # Token Subcommand
//!
//! Issue, inspect and refresh credentials with the same secrets the API
//! server is configured with. Secrets come from flags or from
//! `JWT_ACCESS_SECRET` / `JWT_REFRESH_SECRET`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use carflow_auth::{CredentialSecret, CredentialValidator, IdentityClaims, ValidatorConfig};
use carflow_core::{CredentialKind, Role, TenantId, UserId};

/// Arguments for the `carflow token` subcommand.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Access credential secret.
    #[arg(long, env = "JWT_ACCESS_SECRET", hide_env_values = true, global = true)]
    pub access_secret: Option<String>,

    /// Renewal credential secret.
    #[arg(long, env = "JWT_REFRESH_SECRET", hide_env_values = true, global = true)]
    pub refresh_secret: Option<String>,

    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands.
#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Sign a new credential.
    Issue {
        /// User identifier.
        #[arg(long)]
        user: String,
        /// User email.
        #[arg(long)]
        email: String,
        /// Tenant identifier.
        #[arg(long)]
        tenant: String,
        /// Role: user or admin.
        #[arg(long, default_value = "user")]
        role: String,
        /// Kind: access, refresh, or both.
        #[arg(long, default_value = "access")]
        kind: String,
    },

    /// Validate a credential and print its principal.
    Inspect {
        /// The credential.
        #[arg(value_name = "TOKEN")]
        token: String,
        /// Expected kind: access or refresh.
        #[arg(long, default_value = "access")]
        kind: String,
    },

    /// Mint an access credential from a renewal credential.
    Refresh {
        /// The renewal credential.
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

/// Execute the token subcommand.
pub fn run_token(args: &TokenArgs) -> Result<u8> {
    let validator = build_validator(args.access_secret.as_deref(), args.refresh_secret.as_deref())?;
    match &args.command {
        TokenCommand::Issue {
            user,
            email,
            tenant,
            role,
            kind,
        } => {
            let output = cmd_issue(&validator, user, email, tenant, role, kind)?;
            println!("{output}");
            Ok(0)
        }
        TokenCommand::Inspect { token, kind } => cmd_inspect(&validator, token, kind),
        TokenCommand::Refresh { token } => cmd_refresh(&validator, token),
    }
}

fn build_validator(access: Option<&str>, refresh: Option<&str>) -> Result<CredentialValidator> {
    let access = access.context("access secret required (--access-secret or JWT_ACCESS_SECRET)")?;
    let refresh =
        refresh.context("refresh secret required (--refresh-secret or JWT_REFRESH_SECRET)")?;
    let config = ValidatorConfig::new(
        CredentialSecret::new("access", access)?,
        CredentialSecret::new("refresh", refresh)?,
    );
    Ok(CredentialValidator::new(config)?)
}

/// Issue a credential; returns the JSON printed to stdout.
fn cmd_issue(
    validator: &CredentialValidator,
    user: &str,
    email: &str,
    tenant: &str,
    role: &str,
    kind: &str,
) -> Result<String> {
    let identity = IdentityClaims {
        user_id: UserId::new(user).context("invalid --user")?,
        email: email.to_string(),
        tenant_id: TenantId::new(tenant).context("invalid --tenant")?,
        role: role.parse::<Role>().context("invalid --role")?,
    };

    let output = if kind == "both" {
        let pair = validator.issue_pair(&identity)?;
        serde_json::json!({
            "token": pair.token,
            "refresh_token": pair.refresh_token,
            "expires_at": pair.expires_at,
        })
    } else {
        let kind = kind.parse::<CredentialKind>().context("invalid --kind")?;
        let issued = validator.issue(&identity, kind)?;
        serde_json::json!({
            "token": issued.token,
            "type": kind.as_str(),
            "expires_at": issued.expires_at,
        })
    };
    tracing::info!(user_id = user, tenant_id = tenant, "credential issued");
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Validate a credential. Exit code 0 when valid, 2 when refused.
fn cmd_inspect(validator: &CredentialValidator, token: &str, kind: &str) -> Result<u8> {
    let kind = kind.parse::<CredentialKind>().context("invalid --kind")?;
    match validator.validate(token, kind) {
        Ok(principal) => {
            println!("{}", serde_json::to_string_pretty(&principal)?);
            Ok(0)
        }
        Err(err) => {
            println!("INVALID: {err} ({})", err.reason());
            Ok(2)
        }
    }
}

/// Refresh a credential. Exit code 0 on success, 2 when refused.
fn cmd_refresh(validator: &CredentialValidator, token: &str) -> Result<u8> {
    match validator.refresh(token) {
        Ok(issued) => {
            let output = serde_json::json!({
                "token": issued.token,
                "expires_at": issued.expires_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(0)
        }
        Err(carflow_auth::AuthError::Authentication(err)) => {
            println!("INVALID: {err} ({})", err.reason());
            Ok(2)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = "cli-access-secret-for-tests";
    const REFRESH: &str = "cli-refresh-secret-for-tests";

    fn validator() -> CredentialValidator {
        build_validator(Some(ACCESS), Some(REFRESH)).unwrap()
    }

    fn issued(output: &str, field: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(output).unwrap();
        value[field].as_str().unwrap().to_string()
    }

    #[test]
    fn issue_then_inspect() {
        let v = validator();
        let out = cmd_issue(&v, "u1", "u1@acme.com", "acme", "admin", "access").unwrap();
        let token = issued(&out, "token");
        let principal = v.validate(&token, CredentialKind::Access).unwrap();
        assert_eq!(principal.tenant_id().as_str(), "acme");
        assert_eq!(principal.role(), Role::Admin);
        assert_eq!(cmd_inspect(&v, &token, "access").unwrap(), 0);
        assert_eq!(cmd_inspect(&v, &token, "refresh").unwrap(), 2);
    }

    #[test]
    fn issue_both_then_refresh() {
        let v = validator();
        let out = cmd_issue(&v, "u1", "u1@acme.com", "acme", "user", "both").unwrap();
        let renewal = issued(&out, "refresh_token");
        assert_eq!(cmd_refresh(&v, &renewal).unwrap(), 0);
        let access = issued(&out, "token");
        assert_eq!(cmd_refresh(&v, &access).unwrap(), 2);
    }

    #[test]
    fn bad_inputs_are_errors() {
        let v = validator();
        assert!(cmd_issue(&v, "u1", "e", "acme", "root", "access").is_err());
        assert!(cmd_issue(&v, "u1", "e", "", "user", "access").is_err());
        assert!(cmd_issue(&v, "u1", "e", "acme", "user", "session").is_err());
        assert!(cmd_inspect(&v, "x", "bogus").is_err());
    }

    #[test]
    fn secrets_are_required_and_distinct() {
        assert!(build_validator(None, Some(REFRESH)).is_err());
        assert!(build_validator(Some(ACCESS), None).is_err());
        assert!(build_validator(Some(ACCESS), Some(ACCESS)).is_err());
        assert!(build_validator(Some("short"), Some(REFRESH)).is_err());
    }
}
