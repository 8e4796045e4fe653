//! Common helpers for component parameter checks.

use crate::error::{ComponentError, ComponentResult};
use ts_core::numeric::{ensure_finite, ensure_positive};

/// Mass flows below this magnitude (kg/s) count as no flow.
pub const EPSILON_MDOT: f64 = 1e-9;

/// Finite and strictly positive, else a configuration error.
pub fn require_positive(value: f64, what: &'static str) -> ComponentResult<f64> {
    Ok(ensure_positive(value, what)?)
}

/// Finite and not negative, else a configuration error.
pub fn require_non_negative(value: f64, what: &'static str) -> ComponentResult<f64> {
    let value = ensure_finite(value, what)?;
    if value < 0.0 {
        return Err(ComponentError::configuration(format!(
            "{what} must not be negative (got {value})"
        )));
    }
    Ok(value)
}

/// Unwrap an optional argument, naming it in the error when absent.
pub fn require_present<T>(value: Option<T>, what: &'static str) -> ComponentResult<T> {
    value.ok_or_else(|| ComponentError::configuration(format!("{what} is missing")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_checks() {
        assert!(require_positive(1.0, "v").is_ok());
        assert!(require_positive(0.0, "v").is_err());
        assert!(require_positive(f64::NAN, "v").is_err());
    }

    #[test]
    fn non_negative_checks() {
        assert_eq!(require_non_negative(0.0, "s").unwrap(), 0.0);
        assert!(require_non_negative(-1e-3, "s").is_err());
        assert!(require_non_negative(f64::INFINITY, "s").is_err());
    }

    #[test]
    fn presence_check_names_argument() {
        let err = require_present::<f64>(None, "insulation_lambda").unwrap_err();
        assert!(err.to_string().contains("insulation_lambda"));
    }
}
