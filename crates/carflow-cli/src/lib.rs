//! # carflow-cli: Operator CLI for CarFlow
//!
//! Provides the `carflow` command-line interface for the chores an operator
//! does around the API server without going through it.
//!
//! ## Subcommands
//!
//! - `carflow token`: Issue, inspect and refresh credentials.
//! - `carflow tenants`: Validate a tenants file before deploying it.
//!
//! ```bash
//! export JWT_ACCESS_SECRET=... JWT_REFRESH_SECRET=...
//! carflow token issue --user u1 --email u1@acme.com --tenant acme --role admin
//! carflow token inspect "$TOKEN"
//! carflow tenants validate tenants.json
//! ```

pub mod tenants;
pub mod token;
