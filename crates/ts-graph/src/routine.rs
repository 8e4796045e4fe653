//! Massflow routines.
//!
//! A routine says how the flow stored in one port slot is computed from the
//! flows stored in other, already resolved, slots. The assembly pass emits the
//! routines in dependency order, so evaluating them front to back each step
//! fills every port flow of the network.

use std::fmt;

use crate::graph::PartId;

/// A storage slot in a part's I/O flow buffer.
///
/// `index` is the part's internal (flattened) slot index, not the public
/// cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub part: PartId,
    pub index: usize,
}

impl SlotRef {
    pub fn new(part: PartId, index: usize) -> Self {
        Self { part, index }
    }
}

/// How the target slot is computed from the source slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// The target is set by its owner; evaluation leaves it untouched.
    Prescribed,
    /// target = source
    PassThrough,
    /// target = −source
    Negate,
    /// target = −Σ sources (conservation closure)
    NegatedSum,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::Prescribed => "prescribed",
            Operation::PassThrough => "pass-through",
            Operation::Negate => "negate",
            Operation::NegatedSum => "negated-sum",
        }
    }
}

/// Which side of a hydraulic compensator a resolved port lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Net {
    /// Flow traces back to a prescribing part.
    #[default]
    Flownet,
    /// Flow comes from a compensator's mass balance, decoupled from any
    /// prescribing part.
    Subnet,
}

impl Net {
    /// Net a port falls in after being resolved by `operation`.
    ///
    /// Closure starts a subnet, prescription a flow net; pass-through keeps
    /// the parent's net.
    pub fn after(operation: Operation, parent: Option<Net>) -> Net {
        match operation {
            Operation::NegatedSum => Net::Subnet,
            Operation::Prescribed => Net::Flownet,
            Operation::PassThrough | Operation::Negate => parent.unwrap_or_default(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Net::Flownet => "flownet",
            Net::Subnet => "subnet",
        }
    }
}

/// Read/write access to the flow slots of all parts.
pub trait SlotStore {
    fn read(&self, slot: SlotRef) -> f64;
    fn write(&mut self, slot: SlotRef, value: f64);
}

/// One emitted routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub target: SlotRef,
    pub operation: Operation,
    pub sources: Vec<SlotRef>,
}

impl Routine {
    pub fn prescribed(target: SlotRef) -> Self {
        Self {
            target,
            operation: Operation::Prescribed,
            sources: Vec::new(),
        }
    }

    /// Compute the target value from the current source values.
    ///
    /// Returns `None` for prescribed targets.
    pub fn compute(&self, store: &impl SlotStore) -> Option<f64> {
        let sum = || self.sources.iter().map(|&s| store.read(s)).sum::<f64>();
        match self.operation {
            Operation::Prescribed => None,
            Operation::PassThrough => Some(sum()),
            Operation::Negate => Some(-sum()),
            Operation::NegatedSum => Some(-sum()),
        }
    }

    pub fn evaluate(&self, store: &mut impl SlotStore) {
        if let Some(value) = self.compute(store) {
            store.write(self.target, value);
        }
    }
}

/// Ordered routine list produced by the assembly pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowRoutines {
    routines: Vec<Routine>,
}

impl FlowRoutines {
    pub fn new(routines: Vec<Routine>) -> Self {
        Self { routines }
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Evaluate all routines in emission order.
    pub fn evaluate(&self, store: &mut impl SlotStore) {
        for routine in &self.routines {
            routine.evaluate(store);
        }
    }
}

/// Human-readable audit entry written when a part resolves one of its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRecord {
    pub part: String,
    pub port: String,
    pub operation: Operation,
    /// Source ports as `part:port`.
    pub sources: Vec<String>,
    /// Connected port as `part:port`, when the resolution followed a connection.
    pub connected: Option<String>,
    pub net: Net,
}

impl fmt::Display for ResolutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} <- {}({})",
            self.part,
            self.port,
            self.operation.label(),
            self.sources.join(", ")
        )?;
        if let Some(connected) = &self.connected {
            write!(f, " via {connected}")?;
        }
        write!(f, " [{}]", self.net.label())
    }
}
