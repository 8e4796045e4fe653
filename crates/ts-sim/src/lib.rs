//! Sequential simulation driver for thermostore plants.
//!
//! Provides:
//! - `Plant`: parts assembled into a network with resolved flow routines
//! - Flow and temperature propagation across connections every step
//! - Cooperative step retry driven by the parts' stability verdicts
//! - Explicit Euler commit and decimated recording

pub mod error;
pub mod plant;
pub mod sim;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use plant::{AmbientSchedule, Attempt, Plant};
pub use sim::{SimOptions, SimRecord, run_sim};
