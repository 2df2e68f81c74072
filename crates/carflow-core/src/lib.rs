#![deny(missing_docs)]

//! # carflow-core: Foundational Types for CarFlow Request Admission
//!
//! Every other crate in the workspace depends on this one. It has no
//! internal crate dependencies, only `serde`, `thiserror` and `chrono`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`TenantId`] cannot be passed
//!    where a [`UserId`] is expected. Both validate at construction.
//!
//! 2. **[`Principal`] is immutable.** It is built once from a validated
//!    credential and then only read by downstream stages.
//!
//! 3. **Two credential kinds, one enum.** [`CredentialKind`] carries the
//!    wire tag that keeps access and renewal credentials apart.

pub mod error;
pub mod identity;
pub mod plan;
pub mod principal;

pub use error::ValidationError;
pub use identity::{TenantId, UserId};
pub use plan::{Plan, ResourceLimits};
pub use principal::{CredentialKind, Principal, Role};
