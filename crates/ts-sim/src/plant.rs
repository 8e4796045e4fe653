//! A network of parts with its assembled flow routines.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{SimError, SimResult};
use ts_components::{NetworkPart, SharedAmbient, StepOutput, StepVerdict};
use ts_core::numeric::Real;
use ts_graph::{FlowResolver, FlowRoutines, Network, PortRef, SlotRef, SlotStore, assemble};

/// Ambient temperature [°C] as a function of time [s].
pub type AmbientSchedule = Box<dyn Fn(Real) -> Real>;

/// Flow slots of all parts, addressed by [`SlotRef`].
struct PartSlots<'a>(&'a mut [Box<dyn NetworkPart>]);

impl SlotStore for PartSlots<'_> {
    fn read(&self, slot: SlotRef) -> Real {
        self.0[slot.part.index()].io_flow()[slot.index]
    }

    fn write(&mut self, slot: SlotRef, value: Real) {
        self.0[slot.part.index()].io_flow_mut()[slot.index] = value;
    }
}

/// Outputs of one attempted step over all thermal parts.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    /// One output per thermal part, in part order.
    pub outputs: Vec<StepOutput>,
    pub verdict: StepVerdict,
}

pub struct Plant {
    network: Network,
    parts: Vec<Box<dyn NetworkPart>>,
    routines: FlowRoutines,
    ambient: Option<(SharedAmbient, AmbientSchedule)>,
}

impl Plant {
    /// Check `parts` against `network` and resolve every port flow.
    ///
    /// `parts[i]` must carry the name and ports of the network's part `i`.
    pub fn new(network: Network, mut parts: Vec<Box<dyn NetworkPart>>) -> SimResult<Self> {
        if parts.len() != network.parts().len() {
            return Err(SimError::Mismatch {
                what: format!(
                    "network has {} parts, {} given",
                    network.parts().len(),
                    parts.len()
                ),
            });
        }
        for (part, node) in parts.iter().zip(network.parts()) {
            if part.name() != node.name {
                return Err(SimError::Mismatch {
                    what: format!("expected part {}, found {}", node.name, part.name()),
                });
            }
            let ports: HashSet<String> = part.port_names().into_iter().collect();
            let declared: HashSet<String> = node.ports.iter().cloned().collect();
            if ports != declared {
                return Err(SimError::Mismatch {
                    what: format!("ports of {} differ from the network", node.name),
                });
            }
        }

        let routines = {
            let mut resolvers: Vec<&mut dyn FlowResolver> =
                parts.iter_mut().map(|p| p.resolver()).collect();
            assemble(&network, &mut resolvers)?
        };
        debug!(
            parts = parts.len(),
            routines = routines.len(),
            "plant assembled"
        );
        Ok(Self {
            network,
            parts,
            routines,
            ambient: None,
        })
    }

    /// Drive `shared` from `schedule` before every step.
    pub fn with_ambient(mut self, shared: SharedAmbient, schedule: AmbientSchedule) -> Self {
        self.ambient = Some((shared, schedule));
        self
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn routines(&self) -> &FlowRoutines {
        &self.routines
    }

    pub fn parts(&self) -> &[Box<dyn NetworkPart>] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&dyn NetworkPart> {
        self.parts.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut Box<dyn NetworkPart>> {
        self.parts.iter_mut().find(|p| p.name() == name)
    }

    pub fn update_ambient(&self, t: Real) {
        if let Some((shared, schedule)) = &self.ambient {
            shared.set(schedule(t));
        }
    }

    /// Evaluate the flow routines into the I/O buffers of all parts.
    pub fn propagate_flows(&mut self) {
        self.routines.evaluate(&mut PartSlots(&mut self.parts));
    }

    /// Hand every port the temperature its peer presents at the connection.
    ///
    /// A receiving port advects it; every port conducts with it.
    pub fn propagate_temperatures(&mut self) -> SimResult<()> {
        let mut updates: Vec<(PortRef, Real)> = Vec::new();
        for conn in self.network.connections() {
            for (end, peer) in [(&conn.a, &conn.b), (&conn.b, &conn.a)] {
                let source = &self.parts[peer.part.index()];
                if let Some(t) = source.outlet_temperature(&peer.port) {
                    updates.push((end.clone(), t));
                }
            }
        }
        for (port, t) in updates {
            self.parts[port.part.index()].set_port_temperature(&port.port, t)?;
        }
        Ok(())
    }

    pub fn set_stability_checking(&mut self, enabled: bool) {
        for part in &mut self.parts {
            if let Some(thermal) = part.thermal_mut() {
                thermal.set_stability_checking(enabled);
            }
        }
    }

    /// Step every thermal part with `dt` and reduce the verdicts.
    pub fn attempt(&mut self, dt: Real) -> SimResult<Attempt> {
        let mut outputs = Vec::new();
        for part in &mut self.parts {
            if let Some(thermal) = part.thermal_mut() {
                outputs.push(thermal.step(dt)?);
            }
        }
        let verdict = StepVerdict::reduce(outputs.iter().map(|o| o.verdict));
        Ok(Attempt { outputs, verdict })
    }

    /// Apply an accepted attempt.
    pub fn commit(&mut self, dt: Real, attempt: &Attempt) {
        let thermal = self.parts.iter_mut().filter_map(|p| p.thermal_mut());
        for (part, output) in thermal.zip(&attempt.outputs) {
            part.commit(dt, &output.derivative);
        }
    }

    pub fn reset_to_initial(&mut self) -> SimResult<()> {
        for part in &mut self.parts {
            if let Some(thermal) = part.thermal_mut() {
                thermal.reset_to_initial()?;
            }
        }
        Ok(())
    }

    /// Temperature fields of all thermal parts, in part order.
    pub fn snapshot(&self) -> Vec<Vec<Real>> {
        self.parts
            .iter()
            .filter_map(|p| p.thermal())
            .map(|t| t.temperature().to_vec())
            .collect()
    }
}
