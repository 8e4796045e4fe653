//! Port-flow resolution for parts that act as hydraulic compensators.
//!
//! A compensator resolves its ports from the connected side while more than
//! one of them is open, and closes its mass balance over the last one.

use ts_graph::{
    Net, Operation, ParentPort, PartId, PortSign, ResolutionRecord, ResolutionState, Routine, SlotRef,
};

/// One port as the resolver sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct PortSlot {
    pub name: String,
    pub slot: usize,
    pub sign: PortSign,
}

/// Per-assembly bookkeeping, reset by [`TopologyState::begin`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopologyState {
    part: Option<PartId>,
    open_ports: usize,
    solved: Vec<String>,
    records: Vec<ResolutionRecord>,
}

impl TopologyState {
    pub fn begin(&mut self, part: PartId, port_count: usize) {
        self.part = Some(part);
        self.open_ports = port_count;
        self.solved.clear();
        self.records.clear();
    }

    /// Network id of the part, once assembly has begun.
    pub fn part(&self) -> Option<PartId> {
        self.part
    }

    pub fn open_ports(&self) -> usize {
        self.open_ports
    }

    /// True while other branches should be resolved first.
    pub fn is_deferred(&self) -> bool {
        self.open_ports > 1
    }

    /// Resolved port names in resolution order.
    pub fn solved(&self) -> &[String] {
        &self.solved
    }

    pub fn records(&self) -> &[ResolutionRecord] {
        &self.records
    }

    fn is_solved(&self, port: &str) -> bool {
        self.solved.iter().any(|p| p == port)
    }

    pub fn state(&self, port: &PortSlot, parent: Option<&ParentPort>) -> ResolutionState {
        if self.part.is_none() || self.is_solved(&port.name) {
            return ResolutionState::Resolved;
        }
        match parent {
            Some(parent) => ResolutionState::Passthrough {
                negate: !parent.sign.aligned_with(port.sign),
            },
            None if self.open_ports == 1 => ResolutionState::Closure,
            None => ResolutionState::Blocked,
        }
    }

    /// Emit the routine for `port`. `ports` lists all ports of the part.
    pub fn resolve(
        &mut self,
        part_name: &str,
        port: &PortSlot,
        ports: &[PortSlot],
        parent: Option<&ParentPort>,
    ) -> Option<Routine> {
        let part = self.part?;
        let target = SlotRef::new(part, port.slot);
        let (routine, sources, connected) = match self.state(port, parent) {
            ResolutionState::Passthrough { negate } => {
                let parent = parent?;
                let operation = if negate {
                    Operation::Negate
                } else {
                    Operation::PassThrough
                };
                (
                    Routine {
                        target,
                        operation,
                        sources: vec![parent.slot],
                    },
                    vec![parent.label()],
                    Some(parent.label()),
                )
            }
            ResolutionState::Closure => {
                let others: Vec<&PortSlot> = ports.iter().filter(|p| p.name != port.name).collect();
                (
                    Routine {
                        target,
                        operation: Operation::NegatedSum,
                        sources: others.iter().map(|p| SlotRef::new(part, p.slot)).collect(),
                    },
                    others.iter().map(|p| format!("{part_name}:{}", p.name)).collect(),
                    None,
                )
            }
            _ => return None,
        };

        self.open_ports -= 1;
        self.solved.push(port.name.clone());
        self.records.push(ResolutionRecord {
            part: part_name.to_string(),
            port: port.name.clone(),
            operation: routine.operation,
            sources,
            connected,
            net: Net::after(routine.operation, parent.map(|p| p.net)),
        });
        Some(routine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> Vec<PortSlot> {
        vec![
            PortSlot {
                name: "in".into(),
                slot: 0,
                sign: PortSign::Inflow,
            },
            PortSlot {
                name: "out".into(),
                slot: 4,
                sign: PortSign::Inflow,
            },
        ]
    }

    fn parent(sign: PortSign) -> ParentPort {
        ParentPort {
            part: PartId::from_index(0),
            part_name: "pump".into(),
            port: "out".into(),
            slot: SlotRef::new(PartId::from_index(0), 0),
            sign,
            net: Net::Flownet,
        }
    }

    #[test]
    fn blocked_until_last_port() {
        let mut state = TopologyState::default();
        state.begin(PartId::from_index(1), 2);
        let ports = ports();
        assert!(state.is_deferred());
        assert_eq!(state.state(&ports[1], None), ResolutionState::Blocked);

        let routine = state.resolve("tes", &ports[0], &ports, Some(&parent(PortSign::Outflow)));
        assert_eq!(routine.unwrap().operation, Operation::PassThrough);
        assert!(!state.is_deferred());
        assert_eq!(state.state(&ports[0], None), ResolutionState::Resolved);

        let closure = state.resolve("tes", &ports[1], &ports, None).unwrap();
        assert_eq!(closure.operation, Operation::NegatedSum);
        assert_eq!(closure.sources, vec![SlotRef::new(PartId::from_index(1), 0)]);
        assert_eq!(state.open_ports(), 0);
        assert_eq!(state.solved(), ["in".to_string(), "out".to_string()]);
        assert_eq!(state.records()[0].net, Net::Flownet);
        assert_eq!(
            state.records()[1].to_string(),
            "tes:out <- negated-sum(tes:in) [subnet]"
        );
    }

    #[test]
    fn opposed_signs_negate() {
        let mut state = TopologyState::default();
        state.begin(PartId::from_index(1), 2);
        let ports = ports();
        let routine = state
            .resolve("tes", &ports[0], &ports, Some(&parent(PortSign::Inflow)))
            .unwrap();
        assert_eq!(routine.operation, Operation::Negate);
        assert_eq!(state.records()[0].connected.as_deref(), Some("pump:out"));
    }

    #[test]
    fn parent_in_a_subnet_keeps_the_port_there() {
        let mut state = TopologyState::default();
        state.begin(PartId::from_index(1), 2);
        let ports = ports();
        let decoupled = ParentPort {
            net: Net::Subnet,
            ..parent(PortSign::Outflow)
        };
        state.resolve("tes", &ports[0], &ports, Some(&decoupled)).unwrap();
        assert_eq!(state.records()[0].net, Net::Subnet);
        assert_eq!(
            state.records()[0].to_string(),
            "tes:in <- pass-through(pump:out) via pump:out [subnet]"
        );
    }

    #[test]
    fn resolving_twice_is_refused() {
        let mut state = TopologyState::default();
        state.begin(PartId::from_index(0), 2);
        let ports = ports();
        let p = parent(PortSign::Outflow);
        assert!(state.resolve("tes", &ports[0], &ports, Some(&p)).is_some());
        assert!(state.resolve("tes", &ports[0], &ports, Some(&p)).is_none());
    }
}
