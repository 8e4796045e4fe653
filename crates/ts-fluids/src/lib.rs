//! ts-fluids: temperature-dependent fluid properties for thermostore.
//!
//! Provides:
//! - `FluidProperties` trait mapping a temperature in °C to cp, λ, ρ, ν
//! - `Water`: liquid water correlations (0–100 °C, density maximum near 4 °C)
//! - `Air`: dry air at atmospheric pressure, used for outer free convection
//!
//! # Example
//!
//! ```
//! use ts_fluids::{FluidProperties, Water};
//!
//! let pack = Water.pack(20.0);
//! assert!(pack.rho > 998.0 && pack.rho < 999.0);
//! ```

pub mod air;
pub mod model;
pub mod water;

pub use air::Air;
pub use model::{FluidProperties, PropertyPack};
pub use water::Water;
