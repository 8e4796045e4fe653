//! Core network data structures.

use std::collections::HashMap;
use std::fmt;

/// Compact identifier of a part, equal to its position in the network.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PartId(u32);

impl PartId {
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which direction a positive port flow points, seen from the owning part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortSign {
    /// Positive flow enters the part.
    #[default]
    Inflow,
    /// Positive flow leaves the part.
    Outflow,
}

impl PortSign {
    /// +1 for inflow-positive ports, −1 for outflow-positive ports.
    pub fn factor(self) -> f64 {
        match self {
            PortSign::Inflow => 1.0,
            PortSign::Outflow => -1.0,
        }
    }

    /// Two connected ports see the same physical flow with the same sign when
    /// one counts it as inflow and the other as outflow.
    pub fn aligned_with(self, other: PortSign) -> bool {
        self != other
    }
}

/// A named port on a specific part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub part: PartId,
    pub port: String,
}

impl PortRef {
    pub fn new(part: PartId, port: impl Into<String>) -> Self {
        Self {
            part,
            port: port.into(),
        }
    }
}

/// A part participating in the massflow network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub id: PartId,
    pub name: String,
    pub ports: Vec<String>,
}

impl Part {
    pub fn has_port(&self, port: &str) -> bool {
        self.ports.iter().any(|p| p == port)
    }
}

/// An undirected link between two ports of different parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub a: PortRef,
    pub b: PortRef,
}

/// The validated, immutable network.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) parts: Vec<Part>,
    pub(crate) connections: Vec<Connection>,
    /// Port → peer port, both directions.
    pub(crate) peers: HashMap<PortRef, PortRef>,
}

impl Network {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.index())
    }

    pub fn part_by_name(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Port on the other side of the connection, if the port is connected.
    pub fn peer(&self, port: &PortRef) -> Option<&PortRef> {
        self.peers.get(port)
    }

    /// Total number of ports across all parts.
    pub fn port_count(&self) -> usize {
        self.parts.iter().map(|p| p.ports.len()).sum()
    }
}
