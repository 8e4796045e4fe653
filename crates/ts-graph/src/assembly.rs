//! Network assembly: resolving every port flow of the network once.
//!
//! Each part decides how its own ports are resolved (`FlowResolver`). The
//! assembly pass only schedules: it walks connections outward from prescribed
//! ports, lets deferred parts (hydraulic compensators) wait while other
//! branches can still progress, and falls back to conservation closure when
//! nothing else is possible.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Network, PartId, PortRef, PortSign};
use crate::routine::{FlowRoutines, Net, Routine, SlotRef};

/// The already resolved port on the other side of a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentPort {
    pub part: PartId,
    pub part_name: String,
    pub port: String,
    pub slot: SlotRef,
    pub sign: PortSign,
    /// Net the parent was resolved into.
    pub net: Net,
}

impl ParentPort {
    /// `part:port` label for audit entries.
    pub fn label(&self) -> String {
        format!("{}:{}", self.part_name, self.port)
    }
}

/// How a port could be resolved right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Already resolved.
    Resolved,
    /// Not resolvable with the information given.
    Blocked,
    /// Set by the part itself.
    Prescribed,
    /// Copy (or negate) the connected port's flow.
    Passthrough { negate: bool },
    /// Close the part's mass balance over its other ports.
    Closure,
}

impl ResolutionState {
    pub fn is_resolvable(self) -> bool {
        !matches!(self, ResolutionState::Resolved | ResolutionState::Blocked)
    }
}

/// Port-resolution contract every network part implements.
pub trait FlowResolver {
    fn name(&self) -> &str;

    /// Reset the resolution state; `id` is the part's position in the network.
    fn begin_assembly(&mut self, id: PartId);

    /// Internal flow slot of a port.
    fn port_slot(&self, port: &str) -> Option<SlotRef>;

    fn port_sign(&self, port: &str) -> Option<PortSign>;

    /// True while the part prefers other branches to be resolved first.
    fn is_deferred(&self) -> bool {
        false
    }

    fn resolution_state(&self, port: &str, parent: Option<&ParentPort>) -> ResolutionState;

    /// Resolve one port. Returns `None` when the port is blocked or already resolved.
    fn resolve_port_flow(&mut self, port: &str, parent: Option<&ParentPort>) -> Option<Routine>;

    fn finish_assembly(&mut self) {}
}

/// Resolve every port of `network`, returning the routines in evaluation order.
///
/// `parts[i]` must be the resolver for the part with `PartId` index `i`.
pub fn assemble(
    network: &Network,
    parts: &mut [&mut dyn FlowResolver],
) -> GraphResult<FlowRoutines> {
    if parts.len() != network.parts().len() {
        return Err(GraphError::PartCountMismatch {
            expected: network.parts().len(),
            actual: parts.len(),
        });
    }
    for (i, part) in parts.iter_mut().enumerate() {
        part.begin_assembly(PartId::from_index(i as u32));
    }

    let mut pending: Vec<PortRef> = network
        .parts()
        .iter()
        .flat_map(|p| p.ports.iter().map(|port| PortRef::new(p.id, port.as_str())))
        .collect();
    let mut resolved: HashMap<PortRef, Net> = HashMap::with_capacity(pending.len());
    let mut routines = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let pick = pick_next(network, parts, &pending, &resolved, false)
            .or_else(|| pick_next(network, parts, &pending, &resolved, true))
            .or_else(|| pick_closure(parts, &pending));

        let Some((pos, parent)) = pick else {
            let stuck = &pending[0];
            return Err(GraphError::Unresolvable {
                part: network.parts()[stuck.part.index()].name.clone(),
                port: stuck.port.clone(),
            });
        };

        let port = pending.swap_remove(pos);
        let resolver = &mut parts[port.part.index()];
        let routine = resolver
            .resolve_port_flow(&port.port, parent.as_ref())
            .ok_or_else(|| GraphError::Unresolvable {
                part: resolver.name().to_string(),
                port: port.port.clone(),
            })?;
        let net = Net::after(routine.operation, parent.as_ref().map(|p| p.net));
        debug!(
            part = resolver.name(),
            port = %port.port,
            operation = routine.operation.label(),
            net = net.label(),
            "resolved port flow"
        );
        routines.push(routine);
        resolved.insert(port, net);
    }

    for part in parts.iter_mut() {
        part.finish_assembly();
    }
    Ok(FlowRoutines::new(routines))
}

/// First pending port resolvable from a connection or by itself.
///
/// Without `allow_deferred`, ports of deferred parts are skipped so that other
/// branches go first. Closure is never chosen here.
fn pick_next(
    network: &Network,
    parts: &[&mut dyn FlowResolver],
    pending: &[PortRef],
    resolved: &HashMap<PortRef, Net>,
    allow_deferred: bool,
) -> Option<(usize, Option<ParentPort>)> {
    pending.iter().enumerate().find_map(|(pos, port)| {
        let part = &parts[port.part.index()];
        if part.is_deferred() && !allow_deferred {
            return None;
        }
        let parent = network
            .peer(port)
            .and_then(|peer| Some((peer, *resolved.get(peer)?)))
            .and_then(|(peer, net)| parent_port(network, parts, peer, net));
        match part.resolution_state(&port.port, parent.as_ref()) {
            ResolutionState::Prescribed | ResolutionState::Passthrough { .. } => {
                Some((pos, parent))
            }
            _ => None,
        }
    })
}

fn pick_closure(
    parts: &[&mut dyn FlowResolver],
    pending: &[PortRef],
) -> Option<(usize, Option<ParentPort>)> {
    pending.iter().enumerate().find_map(|(pos, port)| {
        let state = parts[port.part.index()].resolution_state(&port.port, None);
        (state == ResolutionState::Closure).then_some((pos, None))
    })
}

fn parent_port(
    network: &Network,
    parts: &[&mut dyn FlowResolver],
    peer: &PortRef,
    net: Net,
) -> Option<ParentPort> {
    let part = &parts[peer.part.index()];
    Some(ParentPort {
        part: peer.part,
        part_name: network.part(peer.part)?.name.clone(),
        port: peer.port.clone(),
        slot: part.port_slot(&peer.port)?,
        sign: part.port_sign(&peer.port)?,
        net,
    })
}
