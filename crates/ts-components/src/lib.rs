//! ts-components: component models for thermostore networks.
//!
//! Provides:
//! - The stratified thermal storage tank (`ThermalStorage`): geometry, port
//!   registry, port-flow resolution, and the per-step state and stability engine
//! - Flow boundaries (prescribed source, free end)
//! - Convection correlations and ambient temperature providers
//!
//! Every network part implements `NetworkPart`; parts with a temperature
//! state also implement `ThermalPart`.
//!
//! # Example
//!
//! ```
//! use ts_components::{ConstantAmbient, InitialTemperature, TesConfig, TesInit, ThermalStorage};
//! use ts_core::units::{m, m3, w_per_mk};
//!
//! let config = TesConfig::new(m3(1.0), 10, m(1.0), m(0.005));
//! let mut tank = ThermalStorage::new("tes", &config).unwrap();
//! tank.initialize(TesInit {
//!     insulation_thickness: Some(m(0.1)),
//!     insulation_lambda: Some(w_per_mk(0.04)),
//!     t_init: Some(InitialTemperature::Uniform(60.0)),
//!     ambient: Some(Box::new(ConstantAmbient(20.0))),
//! })
//! .unwrap();
//!
//! let out = tank.step(1.0).unwrap();
//! assert!(out.verdict.stable);
//! assert!(out.derivative.iter().all(|d| *d < 0.0));
//! ```

pub mod ambient;
pub mod boundary;
pub mod buoyancy;
pub mod common;
pub mod convection;
pub mod error;
pub mod geometry;
pub mod ports;
pub mod stability;
pub mod storage;
pub mod topology;
pub mod traits;

// Re-exports
pub use ambient::{AmbientSource, ConstantAmbient, SharedAmbient};
pub use boundary::{BOUNDARY_PORT, BoundaryKind, FlowBoundary};
pub use error::{ComponentError, ComponentResult};
pub use geometry::{Geometry, InsulatedShell, PortGeometry, TesConfig, WallMaterial};
pub use ports::{PortExtension, PortIndex, PortPosition, PortRegistry, PortSpec, PortStorage};
pub use stability::{StabilityLimits, StepVerdict};
pub use storage::{Diagnostics, FlowField, InitialTemperature, TesInit, ThermalStorage};
pub use topology::TopologyState;
pub use traits::{NetworkPart, StepOutput, ThermalPart};
