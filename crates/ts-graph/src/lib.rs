//! ts-graph: network topology layer for thermostore.
//!
//! Provides:
//! - Parts, named ports and port-to-port connections (`Network`)
//! - Incremental network builder with validation
//! - Massflow routines: how one port's flow is computed from resolved ports
//! - The assembly pass that asks every part to resolve its ports
//!
//! # Example
//!
//! ```
//! use ts_graph::NetworkBuilder;
//!
//! let mut builder = NetworkBuilder::new();
//! let pump = builder.add_part("pump", ["out"]);
//! let tank = builder.add_part("tank", ["in", "out"]);
//! builder.connect(pump, "out", tank, "in");
//! let network = builder.build().unwrap();
//!
//! assert_eq!(network.parts().len(), 2);
//! assert_eq!(network.connections().len(), 1);
//! ```

pub mod assembly;
pub mod builder;
pub mod error;
pub mod graph;
pub mod routine;
pub(crate) mod validate;

pub use assembly::{FlowResolver, ParentPort, ResolutionState, assemble};
pub use builder::NetworkBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Connection, Network, Part, PartId, PortRef, PortSign};
pub use routine::{FlowRoutines, Net, Operation, ResolutionRecord, Routine, SlotRef, SlotStore};
