//! Error types for component construction and evaluation.

use thiserror::Error;
use ts_core::TsError;

/// Errors raised while building or running a component.
///
/// Stability breaches are not errors: they travel through
/// [`StepVerdict`](crate::stability::StepVerdict).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// Missing or invalid construction/initialization argument.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    /// A port position outside its valid range.
    #[error("Validation error: {what}")]
    Validation { what: String },

    #[error("Component {name} has not been initialized")]
    NotInitialized { name: String },

    #[error("Component {name} has no port named {port}")]
    UnknownPort { name: String, port: String },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl ComponentError {
    pub fn configuration(what: impl Into<String>) -> Self {
        ComponentError::Configuration { what: what.into() }
    }

    pub fn validation(what: impl Into<String>) -> Self {
        ComponentError::Validation { what: what.into() }
    }
}

impl From<TsError> for ComponentError {
    fn from(e: TsError) -> Self {
        ComponentError::Configuration {
            what: e.to_string(),
        }
    }
}
