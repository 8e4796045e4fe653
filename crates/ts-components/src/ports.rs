//! Port registry of a tank.
//!
//! Every port is bound to one cell. Ports sharing a cell get increasing
//! occurrence numbers, and all per-port buffers switch from one value per cell
//! (`Flat`) to one row per occurrence (`Stacked`) on the first collision.

use tracing::debug;

use crate::error::{ComponentError, ComponentResult};
use ts_core::numeric::Real;
use ts_graph::PortSign;

/// Names of the two ports every tank has.
pub const DEFAULT_INLET: &str = "in";
pub const DEFAULT_OUTLET: &str = "out";

/// Bias that pushes a position exactly on a cell boundary into the cell below it.
const TIE_BIAS: Real = 1e-9;

/// Loosely typed port position as read from configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortSpec {
    pub position: Real,
    /// `"index"` or `"volume"`.
    pub kind: String,
}

impl PortSpec {
    pub fn index(index: i64) -> Self {
        Self {
            position: index as Real,
            kind: "index".to_string(),
        }
    }

    pub fn volume(volume: Real) -> Self {
        Self {
            position: volume,
            kind: "volume".to_string(),
        }
    }

    /// Check kind and position type.
    pub fn parse(&self, name: &str) -> ComponentResult<PortPosition> {
        if !self.position.is_finite() {
            return Err(ComponentError::configuration(format!(
                "port {name}: position must be finite (got {})",
                self.position
            )));
        }
        match self.kind.as_str() {
            "index" => {
                if self.position.fract() != 0.0 {
                    return Err(ComponentError::configuration(format!(
                        "port {name}: index position must be an integer (got {})",
                        self.position
                    )));
                }
                Ok(PortPosition::Index(self.position as i64))
            }
            "volume" => Ok(PortPosition::Volume(self.position)),
            other => Err(ComponentError::configuration(format!(
                "port {name}: unknown position kind {other:?}"
            ))),
        }
    }
}

/// Validated port position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PortPosition {
    /// Cell index; −1 means the last cell.
    Index(i64),
    /// Volume measured from the top [m³].
    Volume(Real),
}

impl PortPosition {
    /// Resolve to a cell index of a tank with `n` cells and volume `total`.
    pub fn resolve(self, n: usize, total: Real) -> ComponentResult<usize> {
        match self {
            PortPosition::Index(-1) => Ok(n - 1),
            PortPosition::Index(i) if i >= 0 && (i as usize) < n => Ok(i as usize),
            PortPosition::Index(i) => Err(ComponentError::validation(format!(
                "port index {i} outside [-1, {}]",
                n as i64 - 1
            ))),
            PortPosition::Volume(v) => {
                if !(0.0..=total).contains(&v) {
                    return Err(ComponentError::validation(format!(
                        "port volume {v} outside [0, {total}]"
                    )));
                }
                Ok(volume_to_cell(v, total / n as Real, n))
            }
        }
    }
}

/// Nearest cell centre to a volume position measured from the top.
///
/// A position on a cell boundary goes to the higher index, the cell below it.
pub fn volume_to_cell(volume: Real, cell_volume: Real, n: usize) -> usize {
    let raw = (volume / cell_volume - 0.5 + TIE_BIAS).round();
    raw.clamp(0.0, (n - 1) as Real) as usize
}

/// Ports to add at construction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortExtension {
    /// Only the default `in`/`out` pair.
    NoExtension,
    /// Additional named ports, in insertion order.
    Ports(Vec<(String, PortSpec)>),
}

/// Location of a port: its cell and which occurrence in that cell it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortIndex {
    pub cell: usize,
    pub occurrence: usize,
}

impl PortIndex {
    /// Slot in the row-major per-port buffers of a tank with `n` cells.
    pub fn flat(self, n: usize) -> usize {
        self.occurrence * n + self.cell
    }
}

/// Shape of the per-port buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortStorage {
    Flat(usize),
    Stacked { rows: usize, cols: usize },
}

impl PortStorage {
    pub fn rows(self) -> usize {
        match self {
            PortStorage::Flat(_) => 1,
            PortStorage::Stacked { rows, .. } => rows,
        }
    }

    pub fn cols(self) -> usize {
        match self {
            PortStorage::Flat(cols) | PortStorage::Stacked { cols, .. } => cols,
        }
    }

    pub fn len(self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Shape after appending one occurrence row.
    fn grown(self) -> Self {
        PortStorage::Stacked {
            rows: self.rows() + 1,
            cols: self.cols(),
        }
    }
}

/// Per-port values, all shaped by one [`PortStorage`].
#[derive(Clone, Debug, PartialEq)]
pub struct PortBuffers {
    storage: PortStorage,
    /// Temperature of fluid entering through the port [°C]
    pub temperature: Vec<Real>,
    /// Inflow part of the I/O flow [kg/s]
    pub flow: Vec<Real>,
    /// Signed I/O flow, inflow positive [kg/s]
    pub io_flow: Vec<Real>,
    /// cp at the port temperature [J/(kg·K)]
    pub heat_capacity: Vec<Real>,
    /// Port conductance [W/K]
    pub conductance: Vec<Real>,
}

impl PortBuffers {
    fn new(n: usize) -> Self {
        Self {
            storage: PortStorage::Flat(n),
            temperature: vec![0.0; n],
            flow: vec![0.0; n],
            io_flow: vec![0.0; n],
            heat_capacity: vec![0.0; n],
            conductance: vec![0.0; n],
        }
    }

    pub fn storage(&self) -> PortStorage {
        self.storage
    }

    /// Append one row; existing slots keep their flat index.
    fn grow(&mut self) {
        self.storage = self.storage.grown();
        let len = self.storage.len();
        for buf in [
            &mut self.temperature,
            &mut self.flow,
            &mut self.io_flow,
            &mut self.heat_capacity,
            &mut self.conductance,
        ] {
            buf.resize(len, 0.0);
        }
    }
}

/// A registered port.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub name: String,
    pub index: PortIndex,
    pub sign: PortSign,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortRegistry {
    cells: usize,
    /// Sorted by cell; ports in the same cell keep insertion order.
    ports: Vec<Port>,
    occupancy: Vec<usize>,
    buffers: PortBuffers,
}

impl PortRegistry {
    /// Registry holding the default `in` (cell 0) and `out` (last cell) ports.
    pub fn with_defaults(cells: usize) -> ComponentResult<Self> {
        if cells == 0 {
            return Err(ComponentError::configuration("a tank needs at least one cell"));
        }
        let mut registry = Self {
            cells,
            ports: Vec::new(),
            occupancy: vec![0; cells],
            buffers: PortBuffers::new(cells),
        };
        registry.add(DEFAULT_INLET, 0)?;
        registry.add(DEFAULT_OUTLET, cells - 1)?;
        Ok(registry)
    }

    /// Register the ports of `extension`.
    ///
    /// `None` means the caller supplied neither ports nor the explicit
    /// no-extension marker.
    pub fn add_ports(
        &mut self,
        extension: Option<&PortExtension>,
        volume: Real,
    ) -> ComponentResult<()> {
        let entries = match extension {
            None => {
                return Err(ComponentError::configuration(
                    "new_ports must be given (use NoExtension for the default ports)",
                ));
            }
            Some(PortExtension::NoExtension) => return Ok(()),
            Some(PortExtension::Ports(entries)) => entries,
        };
        for (name, spec) in entries {
            let cell = spec.parse(name)?.resolve(self.cells, volume)?;
            self.add(name, cell)?;
        }
        Ok(())
    }

    /// Bind `name` to `cell`, promoting the buffers when the cell is full.
    pub fn add(&mut self, name: &str, cell: usize) -> ComponentResult<PortIndex> {
        if self.get(name).is_some() {
            return Err(ComponentError::configuration(format!(
                "port {name} is already registered"
            )));
        }
        if cell >= self.cells {
            return Err(ComponentError::validation(format!(
                "port {name}: cell {cell} outside the tank"
            )));
        }
        let occurrence = self.occupancy[cell];
        if occurrence >= self.buffers.storage.rows() {
            self.buffers.grow();
            debug!(
                port = name,
                cell,
                rows = self.buffers.storage.rows(),
                "promoted port storage"
            );
        }
        self.occupancy[cell] += 1;

        let index = PortIndex { cell, occurrence };
        let at = self.ports.partition_point(|p| p.index.cell <= cell);
        self.ports.insert(
            at,
            Port {
                name: name.to_string(),
                index,
                sign: PortSign::Inflow,
            },
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Flat buffer slot of a port.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.get(name).map(|p| p.index.flat(self.cells))
    }

    /// Public (cell) index of a port.
    pub fn cell(&self, name: &str) -> Option<usize> {
        self.get(name).map(|p| p.index.cell)
    }

    pub fn signs(&self) -> Vec<PortSign> {
        self.ports.iter().map(|p| p.sign).collect()
    }

    pub fn storage(&self) -> PortStorage {
        self.buffers.storage
    }

    pub fn buffers(&self) -> &PortBuffers {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut PortBuffers {
        &mut self.buffers
    }

    /// Net signed I/O flow of each cell, summed over occurrence rows.
    pub fn cell_io_sum(&self, out: &mut [Real]) {
        debug_assert_eq!(out.len(), self.cells);
        out.fill(0.0);
        for row in self.buffers.io_flow.chunks_exact(self.cells) {
            for (acc, v) in out.iter_mut().zip(row) {
                *acc += v;
            }
        }
    }
}
