//! Stratified thermal energy storage tank.
//!
//! The tank is a vertical stack of `N` fluid+wall cells, top to bottom. Each
//! step computes the temperature derivative of every cell from
//! - conduction between cells, through the ports and to ambient,
//! - advection of the flows entering through the ports,
//! - buoyant mixing (exchange flow and conductance boost),
//!
//! and judges whether the explicit step is stable.

use tracing::{debug, warn};

use crate::ambient::AmbientSource;
use crate::buoyancy::{convection_boost, exchange_flows};
use crate::common::{EPSILON_MDOT, require_present};
use crate::convection::{Lid, inner_alpha, lid_alpha, outer_alpha};
use crate::error::{ComponentError, ComponentResult};
use crate::geometry::{Geometry, InsulatedShell, TesConfig};
use crate::ports::{PortRegistry, PortStorage};
use crate::stability::{Assessment, StabilityInputs, StabilityLimits, StepVerdict, assess};
use crate::topology::{PortSlot, TopologyState};
use crate::traits::{NetworkPart, StepOutput, ThermalPart};
use ts_core::numeric::{Real, harmonic_mean};
use ts_core::units::{Length, ThermalConductivity};
use ts_fluids::{Air, FluidProperties, PropertyPack, Water};
use ts_graph::{FlowResolver, ParentPort, PartId, PortSign, ResolutionState, Routine, SlotRef};

/// Initial temperature field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialTemperature {
    Uniform(Real),
    /// One value per cell, top to bottom.
    Profile(Vec<Real>),
}

impl InitialTemperature {
    fn expand(&self, n: usize) -> ComponentResult<Vec<Real>> {
        let values = match self {
            InitialTemperature::Uniform(t) => vec![*t; n],
            InitialTemperature::Profile(values) if values.len() == n => values.clone(),
            InitialTemperature::Profile(values) => {
                return Err(ComponentError::configuration(format!(
                    "initial temperature has {} values, expected {n}",
                    values.len()
                )));
            }
        };
        if values.iter().any(|t| !t.is_finite()) {
            return Err(ComponentError::configuration(
                "initial temperature must be finite",
            ));
        }
        Ok(values)
    }
}

/// Initialization parameters.
#[derive(Default)]
pub struct TesInit {
    pub insulation_thickness: Option<Length>,
    pub insulation_lambda: Option<ThermalConductivity>,
    pub t_init: Option<InitialTemperature>,
    pub ambient: Option<Box<dyn AmbientSource>>,
}

/// Counters and last-step values for inspection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Stability breaches let through with checking disabled.
    pub breaches: u64,
    /// Non-finite buoyant exchange flows set to zero.
    pub suppressed_anomalies: u64,
    /// Largest buoyant exchange flow seen so far [kg/s]
    pub max_buoyant_flow: Real,
    /// Heat flow to ambient in the last step [W]
    pub heat_loss: Real,
    pub last_assessment: Option<Assessment>,
}

/// Per-step intermediate fields, kept for inspection after `step`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowField {
    /// Flow entering each cell from the cell above [kg/s]
    pub from_above: Vec<Real>,
    /// Flow entering each cell from the cell below [kg/s]
    pub from_below: Vec<Real>,
    /// Through-flow of each cell [kg/s]
    pub through: Vec<Real>,
    /// Buoyant exchange flow per face [kg/s]
    pub buoyant: Vec<Real>,
}

struct Runtime {
    shell: InsulatedShell,
    ambient: Box<dyn AmbientSource>,
    initial: Vec<Real>,
}

pub struct ThermalStorage {
    name: String,
    geometry: Geometry,
    ports: PortRegistry,
    fluid: Box<dyn FluidProperties>,
    air: Box<dyn FluidProperties>,
    limits: StabilityLimits,
    check_stability: bool,
    /// Cell temperatures with one ghost slot at each end.
    temperature: Vec<Real>,
    runtime: Option<Runtime>,
    topology: TopologyState,
    flows: FlowField,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for ThermalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThermalStorage")
            .field("name", &self.name)
            .field("cells", &self.geometry.grid_points)
            .field("ports", &self.ports.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ThermalStorage {
    /// Build geometry and ports. The tank refuses to step until
    /// [`initialize`](Self::initialize) succeeds.
    pub fn new(name: impl Into<String>, config: &TesConfig) -> ComponentResult<Self> {
        let geometry = Geometry::from_config(config)?;
        let n = geometry.grid_points;
        let mut ports = PortRegistry::with_defaults(n)?;
        ports.add_ports(config.new_ports.as_ref(), geometry.volume)?;
        Ok(Self {
            name: name.into(),
            ports,
            fluid: Box::new(Water),
            air: Box::new(Air),
            limits: StabilityLimits::default(),
            check_stability: true,
            temperature: vec![0.0; n + 2],
            runtime: None,
            topology: TopologyState::default(),
            flows: FlowField::default(),
            diagnostics: Diagnostics::default(),
            geometry,
        })
    }

    /// Replace the stored fluid (water by default).
    pub fn with_fluid(mut self, fluid: Box<dyn FluidProperties>) -> Self {
        self.fluid = fluid;
        self
    }

    pub fn with_limits(mut self, limits: StabilityLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Fix insulation, initial temperature and ambient provider. Allowed once.
    pub fn initialize(&mut self, init: TesInit) -> ComponentResult<()> {
        if self.runtime.is_some() {
            return Err(ComponentError::configuration(format!(
                "{} is already initialized",
                self.name
            )));
        }
        let thickness = require_present(init.insulation_thickness, "insulation_thickness")?;
        let lambda = require_present(init.insulation_lambda, "insulation_lambda")?;
        let shell = InsulatedShell::new(&self.geometry, thickness.value, lambda.value)?;
        let initial =
            require_present(init.t_init, "t_init")?.expand(self.geometry.grid_points)?;
        let ambient = require_present(init.ambient, "ambient_source")?;

        let n = self.geometry.grid_points;
        for (slot, t) in self.ports.buffers_mut().temperature.iter_mut().enumerate() {
            *t = initial[slot % n];
        }
        self.runtime = Some(Runtime {
            shell,
            ambient,
            initial,
        });
        self.restore_initial();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn ports(&self) -> &PortRegistry {
        &self.ports
    }

    pub fn port_storage(&self) -> PortStorage {
        self.ports.storage()
    }

    pub fn shell(&self) -> Option<&InsulatedShell> {
        self.runtime.as_ref().map(|r| &r.shell)
    }

    /// Cell temperatures without the ghost slots.
    pub fn temperature(&self) -> &[Real] {
        let n = self.geometry.grid_points;
        &self.temperature[1..=n]
    }

    pub fn initial_temperature(&self) -> Option<&[Real]> {
        self.runtime.as_ref().map(|r| r.initial.as_slice())
    }

    /// Signed I/O flow per port slot, inflow positive [kg/s].
    pub fn io_flow_mut(&mut self) -> &mut [Real] {
        &mut self.ports.buffers_mut().io_flow
    }

    /// Set the I/O flow of one port [kg/s].
    pub fn set_port_flow(&mut self, port: &str, flow: Real) -> ComponentResult<()> {
        let slot = self.slot_of(port)?;
        self.ports.buffers_mut().io_flow[slot] = flow;
        Ok(())
    }

    pub fn port_temperature(&self, port: &str) -> Option<Real> {
        let slot = self.ports.slot(port)?;
        Some(self.ports.buffers().temperature[slot])
    }

    pub fn topology(&self) -> &TopologyState {
        &self.topology
    }

    pub fn flows(&self) -> &FlowField {
        &self.flows
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn stability_checking(&self) -> bool {
        self.check_stability
    }

    fn slot_of(&self, port: &str) -> ComponentResult<usize> {
        self.ports.slot(port).ok_or_else(|| ComponentError::UnknownPort {
            name: self.name.clone(),
            port: port.to_string(),
        })
    }

    fn port_slots(&self) -> Vec<PortSlot> {
        let n = self.geometry.grid_points;
        self.ports
            .ports()
            .iter()
            .map(|p| PortSlot {
                name: p.name.clone(),
                slot: p.index.flat(n),
                sign: p.sign,
            })
            .collect()
    }

    fn refresh_ghosts(&mut self) {
        let n = self.geometry.grid_points;
        self.temperature[0] = self.temperature[1];
        self.temperature[n + 1] = self.temperature[n];
    }

    fn restore_initial(&mut self) {
        let Some(runtime) = &self.runtime else {
            return;
        };
        let n = self.geometry.grid_points;
        self.temperature[1..=n].copy_from_slice(&runtime.initial);
        self.ports.buffers_mut().io_flow.fill(0.0);
        self.refresh_ghosts();
    }

    /// Restore the initial temperature field and clear the I/O flows.
    ///
    /// Port temperatures belong to the connected parts and are left as they
    /// are.
    pub fn reset_to_initial(&mut self) -> ComponentResult<()> {
        if self.runtime.is_none() {
            return Err(ComponentError::NotInitialized {
                name: self.name.clone(),
            });
        }
        self.restore_initial();
        Ok(())
    }

    /// Temperature derivative of every cell for a step of `dt` seconds.
    ///
    /// Reads the I/O flows and port temperatures as last written by the
    /// network. The state is left untouched; see [`ThermalPart::commit`].
    pub fn step(&mut self, dt: Real) -> ComponentResult<StepOutput> {
        let Some(runtime) = &self.runtime else {
            return Err(ComponentError::NotInitialized {
                name: self.name.clone(),
            });
        };
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ComponentError::validation(format!(
                "step size must be positive (got {dt})"
            )));
        }
        let g = &self.geometry;
        let n = g.grid_points;
        let t_amb = runtime.ambient.temperature();
        let cells = &self.temperature[1..=n];

        // Flow propagation, top to bottom.
        let mut io_sum = vec![0.0; n];
        self.ports.cell_io_sum(&mut io_sum);
        let mut carried = vec![0.0; n];
        let mut acc = 0.0;
        for (c, s) in carried.iter_mut().zip(&io_sum) {
            acc += s;
            *c = acc;
        }
        let mut from_above = vec![0.0; n];
        let mut from_below = vec![0.0; n];
        for i in 0..n {
            if i > 0 {
                from_above[i] = carried[i - 1].max(0.0);
            }
            if i + 1 < n {
                from_below[i] = (-carried[i]).max(0.0);
            }
        }
        let mut through: Vec<Real> = carried.iter().map(|c| c.abs()).collect();
        if n > 1 {
            through[n - 1] = through[n - 2];
        }

        // Properties.
        let packs: Vec<PropertyPack> = cells.iter().map(|&t| self.fluid.pack(t)).collect();
        let rho: Vec<Real> = packs.iter().map(|p| p.rho).collect();
        let mut internal = vec![0.0; n + 2];
        for i in 0..n {
            internal[i + 1] = packs[i].cp * cells[i];
        }
        let thermal_mass: Vec<Real> = packs
            .iter()
            .zip(&g.wall_heat_capacity)
            .map(|(p, wall)| p.rho_cp() * g.cell_volume + wall)
            .collect();

        // Buoyant exchange across unstable density steps.
        let exchange = exchange_flows(&rho, g.grid_spacing, g.cross_section, g.inner_diameter, dt);
        for (f, &q) in exchange.faces.iter().enumerate() {
            from_above[f + 1] += q;
            from_below[f] += q;
        }

        // Cell-to-cell conductance, boosted where the lower cell is warmer.
        // The plate properties are those of the lower cell.
        let mut face_ua = vec![0.0; n.saturating_sub(1)];
        for (f, ua) in face_ua.iter_mut().enumerate() {
            let (upper, lower) = (cells[f], cells[f + 1]);
            let mut boost = 1.0;
            if lower > upper {
                boost = convection_boost(
                    &packs[f + 1],
                    self.fluid.beta(lower),
                    lower - upper,
                    g.inner_diameter / 4.0,
                );
            }
            let lambda = harmonic_mean(packs[f].lambda, packs[f + 1].lambda);
            *ua = lambda * boost * g.cross_section / g.grid_spacing + g.wall_axial_conductance;
        }

        let mut heat = vec![0.0; n];
        let mut inflow: Vec<Real> = from_above.iter().zip(&from_below).map(|(a, b)| a + b).collect();
        for i in 0..n {
            heat[i] += from_above[i] * internal[i] + from_below[i] * internal[i + 2];
        }
        for (f, ua) in face_ua.iter().enumerate() {
            let q = ua * (cells[f + 1] - cells[f]);
            heat[f] += q;
            heat[f + 1] -= q;
        }

        // Ports: advection of entering fluid and conduction through the stub.
        let mut max_port_ua: Real = 0.0;
        let port_cells: Vec<(usize, usize)> = self
            .ports
            .ports()
            .iter()
            .map(|p| (p.index.flat(n), p.index.cell))
            .collect();
        {
            let buffers = self.ports.buffers_mut();
            for (slot, cell) in port_cells {
                let entering = buffers.io_flow[slot].max(0.0);
                // Conduction always sees the connected part's temperature.
                let t_port = buffers.temperature[slot];
                let pack = self.fluid.pack(t_port);
                let ua = g.port_conductance(harmonic_mean(packs[cell].lambda, pack.lambda));
                buffers.flow[slot] = entering;
                buffers.heat_capacity[slot] = pack.cp;
                buffers.conductance[slot] = ua;
                max_port_ua = max_port_ua.max(ua);

                heat[cell] += ua * (t_port - cells[cell]);
                if entering > EPSILON_MDOT {
                    heat[cell] += entering * pack.cp * t_port;
                    inflow[cell] += entering;
                }
            }
        }
        for i in 0..n {
            heat[i] -= inflow[i] * internal[i + 1];
        }

        // Ambient losses: lateral shell on every cell, lids on the end cells.
        let shell = &runtime.shell;
        let air = self.air.as_ref();
        let mut heat_loss = 0.0;
        let mut max_ambient_ua: Real = 0.0;
        let alpha_inner: Vec<Real> = (0..n)
            .map(|i| {
                let x = g.dist_from_start[i];
                inner_alpha(&packs[i], through[i], g.inner_diameter, g.cross_section, x)
            })
            .collect();
        for i in 0..n {
            let alpha_outer = outer_alpha(air, cells[i], t_amb, g.flow_length[i]);
            let ua = shell.lateral_conductance(g, alpha_inner[i], alpha_outer);
            let q = ua * (t_amb - cells[i]);
            heat[i] += q;
            heat_loss -= q;
            max_ambient_ua = max_ambient_ua.max(ua);
        }
        for (lid, i) in [(Lid::Top, 0), (Lid::Bottom, n - 1)] {
            let alpha_lid = lid_alpha(air, lid, cells[i], t_amb, shell.lid_flow_length());
            let ua = shell.lid_conductance(g, alpha_inner[i], alpha_lid);
            let q = ua * (t_amb - cells[i]);
            heat[i] += q;
            heat_loss -= q;
            max_ambient_ua = max_ambient_ua.max(ua);
        }

        let derivative: Vec<Real> = heat.iter().zip(&thermal_mass).map(|(q, m)| q / m).collect();

        // Stability of the explicit step.
        let inputs = StabilityInputs {
            max_cell_conductance: face_ua.iter().copied().fold(0.0, Real::max),
            max_port_conductance: max_port_ua,
            max_ambient_conductance: max_ambient_ua,
            max_rho_cp: packs.iter().map(PropertyPack::rho_cp).fold(0.0, Real::max),
            max_specific_inflow: inflow
                .iter()
                .zip(&rho)
                .map(|(m, rho)| m / (rho * g.cell_volume))
                .fold(0.0, Real::max),
            grid_spacing: g.grid_spacing,
            cross_section: g.cross_section,
        };
        let assessment = assess(&inputs, dt, &self.limits);
        let verdict = if !assessment.breached() {
            StepVerdict::STABLE
        } else if self.check_stability {
            let verdict = assessment.verdict(dt, &self.limits);
            debug!(
                part = %self.name,
                dt,
                ratio = assessment.ratio,
                proposed_dt = ?verdict.proposed_dt,
                "stability limit exceeded"
            );
            verdict
        } else {
            self.diagnostics.breaches += 1;
            warn!(
                part = %self.name,
                dt,
                diffusion = assessment.diffusion_number,
                courant = assessment.courant_number,
                "stability limit exceeded with checking disabled"
            );
            StepVerdict::STABLE
        };

        self.diagnostics.suppressed_anomalies += exchange.anomalies as u64;
        self.diagnostics.max_buoyant_flow = self.diagnostics.max_buoyant_flow.max(exchange.max());
        self.diagnostics.heat_loss = heat_loss;
        self.diagnostics.last_assessment = Some(assessment);
        self.flows = FlowField {
            from_above,
            from_below,
            through,
            buoyant: exchange.faces,
        };

        Ok(StepOutput {
            derivative,
            verdict,
        })
    }
}

impl ThermalPart for ThermalStorage {
    fn temperature(&self) -> &[Real] {
        ThermalStorage::temperature(self)
    }

    fn step(&mut self, dt: Real) -> ComponentResult<StepOutput> {
        ThermalStorage::step(self, dt)
    }

    fn commit(&mut self, dt: Real, derivative: &[Real]) {
        let n = self.geometry.grid_points;
        for (t, d) in self.temperature[1..=n].iter_mut().zip(derivative) {
            *t += dt * d;
        }
        self.refresh_ghosts();
    }

    fn set_stability_checking(&mut self, enabled: bool) {
        self.check_stability = enabled;
    }

    fn reset_to_initial(&mut self) -> ComponentResult<()> {
        ThermalStorage::reset_to_initial(self)
    }
}

impl FlowResolver for ThermalStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_assembly(&mut self, id: PartId) {
        self.topology.begin(id, self.ports.len());
    }

    fn port_slot(&self, port: &str) -> Option<SlotRef> {
        Some(SlotRef::new(self.topology.part()?, self.ports.slot(port)?))
    }

    fn port_sign(&self, port: &str) -> Option<PortSign> {
        self.ports.get(port).map(|p| p.sign)
    }

    fn is_deferred(&self) -> bool {
        self.topology.is_deferred()
    }

    fn resolution_state(&self, port: &str, parent: Option<&ParentPort>) -> ResolutionState {
        let slots = self.port_slots();
        match slots.iter().find(|p| p.name == port) {
            Some(slot) => self.topology.state(slot, parent),
            None => ResolutionState::Blocked,
        }
    }

    fn resolve_port_flow(&mut self, port: &str, parent: Option<&ParentPort>) -> Option<Routine> {
        let slots = self.port_slots();
        let slot = slots.iter().find(|p| p.name == port)?;
        self.topology.resolve(&self.name, slot, &slots, parent)
    }

    fn finish_assembly(&mut self) {
        for record in self.topology.records() {
            debug!(part = %self.name, "{record}");
        }
    }
}

impl NetworkPart for ThermalStorage {
    fn resolver(&mut self) -> &mut dyn FlowResolver {
        self
    }

    fn port_names(&self) -> Vec<String> {
        self.ports.names().map(str::to_string).collect()
    }

    fn io_flow(&self) -> &[Real] {
        &self.ports.buffers().io_flow
    }

    fn io_flow_mut(&mut self) -> &mut [Real] {
        ThermalStorage::io_flow_mut(self)
    }

    fn outlet_temperature(&self, port: &str) -> Option<Real> {
        let cell = self.ports.cell(port)?;
        Some(self.temperature()[cell])
    }

    fn set_port_temperature(&mut self, port: &str, t: Real) -> ComponentResult<()> {
        let slot = self.slot_of(port)?;
        self.ports.buffers_mut().temperature[slot] = t;
        Ok(())
    }

    fn thermal(&self) -> Option<&dyn ThermalPart> {
        Some(self)
    }

    fn thermal_mut(&mut self) -> Option<&mut dyn ThermalPart> {
        Some(self)
    }
}
