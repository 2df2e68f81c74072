#![deny(missing_docs)]

//! # carflow-tenancy: Tenant Directory and Isolation Scopes
//!
//! Two collaborators of the admission pipeline:
//!
//! - [`TenantDirectory`]: the tenant configuration provider. Supplies each
//!   tenant's plan and limits; [`TenantBudget`] adapts it into a rate
//!   limiter [`BudgetSource`](carflow_ratelimit::BudgetSource).
//! - [`ScopeManager`]: binds a tenant to the storage session for exactly
//!   the duration of one request and guarantees the binding is released on
//!   every exit path.
//!
//! ## Scope Lifecycle
//!
//! ```text
//! bind(tenant) ─▶ handler future ─┬─ Ok / Err ──▶ unbind ─▶ return
//!                                 ├─ panic ─────▶ unbind ─▶ resume_unwind
//!                                 └─ dropped ───▶ unbind spawned on runtime
//! ```
//!
//! Storage itself sits behind [`SessionBinder`]. [`InMemorySessionBinder`]
//! is the reference implementation used in development and tests.

pub mod directory;
pub mod error;
pub mod scope;
pub mod session;
pub mod tenant;

pub use directory::{InMemoryTenantDirectory, TenantBudget, TenantDirectory};
pub use error::{DirectoryError, IsolationError};
pub use scope::{IsolationScope, ScopeManager};
pub use session::{InMemorySessionBinder, SessionBinder};
pub use tenant::{Tenant, TenantStatus};
