//! Incremental network builder.

use std::collections::HashMap;

use crate::error::GraphResult;
use crate::graph::{Connection, Network, Part, PartId, PortRef};
use crate::validate;

/// Builder for constructing a network incrementally.
///
/// Use `add_part` and `connect` to describe the network, then call `build()`
/// to validate and freeze it into an immutable `Network`.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    parts: Vec<Part>,
    connections: Vec<Connection>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part with the given port names and return its ID.
    pub fn add_part<I, S>(&mut self, name: impl Into<String>, ports: I) -> PartId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = PartId::from_index(self.parts.len() as u32);
        self.parts.push(Part {
            id,
            name: name.into(),
            ports: ports.into_iter().map(Into::into).collect(),
        });
        id
    }

    /// Connect port `a_port` of part `a` with port `b_port` of part `b`.
    ///
    /// References are checked in `build()`.
    pub fn connect(
        &mut self,
        a: PartId,
        a_port: impl Into<String>,
        b: PartId,
        b_port: impl Into<String>,
    ) {
        self.connections.push(Connection {
            a: PortRef::new(a, a_port),
            b: PortRef::new(b, b_port),
        });
    }

    /// Validate and build the network.
    pub fn build(self) -> GraphResult<Network> {
        validate::validate_parts(&self.parts)?;
        validate::validate_connections(&self.parts, &self.connections)?;

        let mut peers = HashMap::with_capacity(2 * self.connections.len());
        for conn in &self.connections {
            peers.insert(conn.a.clone(), conn.b.clone());
            peers.insert(conn.b.clone(), conn.a.clone());
        }

        Ok(Network {
            parts: self.parts,
            connections: self.connections,
            peers,
        })
    }
}
