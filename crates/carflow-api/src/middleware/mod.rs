//! # Admission Middleware
//!
//! One module per pipeline stage. Order of execution, outermost first:
//!
//! ```text
//! tracing → recovery → cors → identity → rate_limit → isolation → handler
//! ```

pub mod cors;
pub mod identity;
pub mod isolation;
pub mod rate_limit;
pub mod recovery;
pub mod tracing_layer;

/// Count one refused request, labeled by stage.
pub(crate) fn record_denial(reason: &'static str) {
    metrics::counter!("carflow_admission_denied_total", "reason" => reason).increment(1);
}
