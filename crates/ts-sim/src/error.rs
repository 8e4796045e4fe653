//! Error types for simulation runs.

use thiserror::Error;

/// Errors encountered while assembling or running a plant.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// The part list does not match the network it is assembled into.
    #[error("Plant mismatch: {what}")]
    Mismatch { what: String },

    #[error("Step size {dt} s at t = {t} s fell below the minimum {min_dt} s")]
    StepTooSmall { t: f64, dt: f64, min_dt: f64 },

    #[error("Step at t = {t} s still unstable after {retries} retries")]
    RetriesExhausted { t: f64, retries: usize },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<ts_components::ComponentError> for SimError {
    fn from(e: ts_components::ComponentError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<ts_graph::GraphError> for SimError {
    fn from(e: ts_graph::GraphError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_keep_their_message() {
        let err: SimError = ts_components::ComponentError::NotInitialized {
            name: "tes".into(),
        }
        .into();
        assert!(err.to_string().contains("tes"));
    }
}
