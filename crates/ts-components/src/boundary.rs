//! Single-port flow boundaries: a prescribed source or a free end.

use crate::error::{ComponentError, ComponentResult};
use crate::traits::NetworkPart;
use ts_core::numeric::Real;
use ts_core::units::MassRate;
use ts_graph::{
    FlowResolver, Operation, ParentPort, PartId, PortSign, ResolutionState, Routine, SlotRef,
};

/// Name of the only port of a boundary.
pub const BOUNDARY_PORT: &str = "port";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryKind {
    /// Delivers `mass_flow` into the network (negative draws from it).
    Source { mass_flow: MassRate },
    /// Takes whatever the connected part delivers.
    FreeEnd,
}

/// A network boundary. Its port counts flow leaving the boundary as positive.
#[derive(Clone, Debug)]
pub struct FlowBoundary {
    name: String,
    kind: BoundaryKind,
    /// Temperature of fluid delivered into the network [°C]
    temperature: Real,
    /// Temperature last presented by the connected part [°C]
    received: Option<Real>,
    io_flow: [Real; 1],
    part: Option<PartId>,
    resolved: bool,
}

impl FlowBoundary {
    pub fn source(name: impl Into<String>, mass_flow: MassRate, temperature: Real) -> Self {
        Self::with_kind(name, BoundaryKind::Source { mass_flow }, temperature)
    }

    /// Free end; `temperature` applies whenever the network draws from it.
    pub fn free_end(name: impl Into<String>, temperature: Real) -> Self {
        Self::with_kind(name, BoundaryKind::FreeEnd, temperature)
    }

    fn with_kind(name: impl Into<String>, kind: BoundaryKind, temperature: Real) -> Self {
        let io = match kind {
            BoundaryKind::Source { mass_flow } => mass_flow.value,
            BoundaryKind::FreeEnd => 0.0,
        };
        Self {
            name: name.into(),
            kind,
            temperature,
            received: None,
            io_flow: [io],
            part: None,
            resolved: false,
        }
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    /// Outflow-positive flow through the port [kg/s].
    pub fn flow(&self) -> Real {
        self.io_flow[0]
    }

    pub fn set_temperature(&mut self, t: Real) {
        self.temperature = t;
    }

    /// Change the prescribed flow of a source.
    pub fn set_mass_flow(&mut self, mass_flow: MassRate) -> ComponentResult<()> {
        match &mut self.kind {
            BoundaryKind::Source { mass_flow: m } => {
                *m = mass_flow;
                self.io_flow[0] = mass_flow.value;
                Ok(())
            }
            BoundaryKind::FreeEnd => Err(ComponentError::configuration(format!(
                "{} is a free end and has no prescribed flow",
                self.name
            ))),
        }
    }

    pub fn received_temperature(&self) -> Option<Real> {
        self.received
    }

    fn check_port(&self, port: &str) -> ComponentResult<()> {
        if port == BOUNDARY_PORT {
            Ok(())
        } else {
            Err(ComponentError::UnknownPort {
                name: self.name.clone(),
                port: port.to_string(),
            })
        }
    }
}

impl FlowResolver for FlowBoundary {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_assembly(&mut self, id: PartId) {
        self.part = Some(id);
        self.resolved = false;
    }

    fn port_slot(&self, port: &str) -> Option<SlotRef> {
        (port == BOUNDARY_PORT).then_some(SlotRef::new(self.part?, 0))
    }

    fn port_sign(&self, port: &str) -> Option<PortSign> {
        (port == BOUNDARY_PORT).then_some(PortSign::Outflow)
    }

    fn resolution_state(&self, port: &str, parent: Option<&ParentPort>) -> ResolutionState {
        if port != BOUNDARY_PORT || self.resolved {
            return ResolutionState::Resolved;
        }
        match (self.kind, parent) {
            (BoundaryKind::Source { .. }, _) => ResolutionState::Prescribed,
            (BoundaryKind::FreeEnd, Some(parent)) => ResolutionState::Passthrough {
                negate: !parent.sign.aligned_with(PortSign::Outflow),
            },
            (BoundaryKind::FreeEnd, None) => ResolutionState::Blocked,
        }
    }

    fn resolve_port_flow(&mut self, port: &str, parent: Option<&ParentPort>) -> Option<Routine> {
        let target = SlotRef::new(self.part?, 0);
        let routine = match self.resolution_state(port, parent) {
            ResolutionState::Prescribed => Routine::prescribed(target),
            ResolutionState::Passthrough { negate } => Routine {
                target,
                operation: if negate {
                    Operation::Negate
                } else {
                    Operation::PassThrough
                },
                sources: vec![parent?.slot],
            },
            _ => return None,
        };
        self.resolved = true;
        Some(routine)
    }
}

impl NetworkPart for FlowBoundary {
    fn resolver(&mut self) -> &mut dyn FlowResolver {
        self
    }

    fn port_names(&self) -> Vec<String> {
        vec![BOUNDARY_PORT.to_string()]
    }

    fn io_flow(&self) -> &[Real] {
        &self.io_flow
    }

    fn io_flow_mut(&mut self) -> &mut [Real] {
        &mut self.io_flow
    }

    fn outlet_temperature(&self, port: &str) -> Option<Real> {
        (port == BOUNDARY_PORT).then_some(self.temperature)
    }

    fn set_port_temperature(&mut self, port: &str, t: Real) -> ComponentResult<()> {
        self.check_port(port)?;
        self.received = Some(t);
        Ok(())
    }
}
