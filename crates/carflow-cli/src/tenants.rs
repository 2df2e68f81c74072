//! # Tenants Subcommand
//!
//! Checks a tenants file (the server's `TENANTS_FILE`) offline.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use carflow_tenancy::{Tenant, TenantStatus};

/// Arguments for the `carflow tenants` subcommand.
#[derive(Args, Debug)]
pub struct TenantsArgs {
    #[command(subcommand)]
    pub command: TenantsCommand,
}

/// Tenants subcommands.
#[derive(Subcommand, Debug)]
pub enum TenantsCommand {
    /// Parse a tenants file and report problems.
    Validate {
        /// Path to the JSON tenants file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Execute the tenants subcommand.
pub fn run_tenants(args: &TenantsArgs) -> Result<u8> {
    match &args.command {
        TenantsCommand::Validate { file } => {
            let problems = cmd_validate(file)?;
            if problems.is_empty() {
                println!("OK: {}", file.display());
                return Ok(0);
            }
            for p in &problems {
                println!("FAIL: {p}");
            }
            Ok(1)
        }
    }
}

/// Load `path` and return a list of problems. Unreadable or unparseable
/// files are errors, not problems.
fn cmd_validate(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        bail!("tenants file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tenants file: {}", path.display()))?;
    let tenants: Vec<Tenant> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse tenants file: {}", path.display()))?;

    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for t in &tenants {
        if !seen.insert(t.id.clone()) {
            problems.push(format!("{}: duplicate tenant id", t.id));
        }
        if t.api_rate_limit() == 0 {
            problems.push(format!("{}: api_rate_limit is 0; every request would fail", t.id));
        }
        if t.status != TenantStatus::Active {
            tracing::warn!(tenant_id = %t.id, status = t.status.as_str(), "tenant is not active");
        }
    }
    tracing::info!(tenants = tenants.len(), problems = problems.len(), "tenants file checked");
    Ok(problems)
}
