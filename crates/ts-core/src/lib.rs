//! ts-core: shared foundation for thermostore.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{TsError, TsResult};
pub use numeric::*;
pub use units::*;
