use thiserror::Error;

use crate::models::DivePlan;

/// Error type for dive planning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Rejected before the first tick runs.
    #[error("invalid configuration: {field} {reason}")]
    Configuration { field: String, reason: String },

    /// The ascent never cleared the surface ceiling. `partial` holds the
    /// plan as far as it was simulated.
    #[error("ascent did not clear the surface ceiling within {limit_min} min")]
    Divergence {
        limit_min: f64,
        partial: Box<DivePlan>,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PlanError {
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        PlanError::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::InvalidInput(err.to_string())
    }
}
