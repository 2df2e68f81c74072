//! # carflow CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use carflow_cli::tenants::{run_tenants, TenantsArgs};
use carflow_cli::token::{run_token, TokenArgs};

/// CarFlow operator CLI.
///
/// Issues and inspects API credentials and validates tenant configuration.
#[derive(Parser, Debug)]
#[command(name = "carflow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue, inspect and refresh credentials.
    Token(TokenArgs),

    /// Tenant configuration checks.
    Tenants(TenantsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Token(args) => run_token(&args),
        Commands::Tenants(args) => run_tenants(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carflow_cli::tenants::TenantsCommand;
    use carflow_cli::token::TokenCommand;

    #[test]
    fn parse_token_issue() {
        let cli = Cli::try_parse_from([
            "carflow",
            "token",
            "--access-secret",
            "a",
            "issue",
            "--user",
            "u1",
            "--email",
            "u1@acme.com",
            "--tenant",
            "acme",
        ])
        .unwrap();
        let Commands::Token(args) = cli.command else {
            panic!("expected token command");
        };
        assert_eq!(args.access_secret.as_deref(), Some("a"));
        match args.command {
            TokenCommand::Issue { role, kind, .. } => {
                assert_eq!(role, "user");
                assert_eq!(kind, "access");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_token_inspect_with_kind() {
        let cli = Cli::try_parse_from(["carflow", "-vv", "token", "inspect", "abc", "--kind", "refresh"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Token(args) = cli.command else {
            panic!("expected token command");
        };
        assert!(matches!(args.command, TokenCommand::Inspect { ref kind, .. } if kind == "refresh"));
    }

    #[test]
    fn parse_tenants_validate() {
        let cli = Cli::try_parse_from(["carflow", "tenants", "validate", "t.json"]).unwrap();
        let Commands::Tenants(args) = cli.command else {
            panic!("expected tenants command");
        };
        let TenantsCommand::Validate { file } = args.command;
        assert_eq!(file.to_str(), Some("t.json"));
    }

    #[test]
    fn issue_requires_tenant() {
        assert!(Cli::try_parse_from(["carflow", "token", "issue", "--user", "u1", "--email", "e"]).is_err());
    }
}
