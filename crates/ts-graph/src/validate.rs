//! Structural validation for networks.

use std::collections::HashSet;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Connection, Part, PortRef};

/// Part names and the port names within a part must be unique.
pub(crate) fn validate_parts(parts: &[Part]) -> GraphResult<()> {
    let mut names = HashSet::new();
    for part in parts {
        if !names.insert(part.name.as_str()) {
            return Err(GraphError::DuplicatePartName {
                name: part.name.clone(),
            });
        }
        let mut ports = HashSet::new();
        for port in &part.ports {
            if !ports.insert(port.as_str()) {
                return Err(GraphError::DuplicatePortName {
                    part: part.name.clone(),
                    port: port.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Every connection must reference existing ports, and each port may take
/// part in at most one connection.
pub(crate) fn validate_connections(parts: &[Part], connections: &[Connection]) -> GraphResult<()> {
    let mut used: HashSet<&PortRef> = HashSet::new();
    for conn in connections {
        for end in [&conn.a, &conn.b] {
            let part = parts
                .get(end.part.index())
                .ok_or_else(|| GraphError::UnknownPart {
                    part: end.part.to_string(),
                })?;
            if !part.has_port(&end.port) {
                return Err(GraphError::UnknownPort {
                    part: part.name.clone(),
                    port: end.port.clone(),
                });
            }
        }
        if conn.a == conn.b {
            return Err(GraphError::SelfConnection {
                part: parts[conn.a.part.index()].name.clone(),
                port: conn.a.port.clone(),
            });
        }
        for end in [&conn.a, &conn.b] {
            if !used.insert(end) {
                return Err(GraphError::PortAlreadyConnected {
                    part: parts[end.part.index()].name.clone(),
                    port: end.port.clone(),
                });
            }
        }
    }
    Ok(())
}
