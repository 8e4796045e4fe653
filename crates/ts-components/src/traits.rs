//! Contracts between components and the simulation driver.

use crate::error::ComponentResult;
use crate::stability::StepVerdict;
use ts_core::numeric::Real;
use ts_graph::FlowResolver;

/// Result of one attempted step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutput {
    /// dT/dt per cell [K/s]
    pub derivative: Vec<Real>,
    pub verdict: StepVerdict,
}

/// A component with a temperature state advanced by the driver.
///
/// The driver may call `step` several times for the same step boundary with
/// shrinking `dt`; nothing changes until `commit`.
pub trait ThermalPart {
    /// Cell temperatures [°C], top to bottom.
    fn temperature(&self) -> &[Real];

    fn step(&mut self, dt: Real) -> ComponentResult<StepOutput>;

    /// Apply an accepted step.
    fn commit(&mut self, dt: Real, derivative: &[Real]);

    fn set_stability_checking(&mut self, enabled: bool);

    fn reset_to_initial(&mut self) -> ComponentResult<()>;
}

/// A part of the massflow network.
///
/// Each port owns one slot of the part's I/O flow buffer; the flow network
/// writes these slots before every step.
pub trait NetworkPart: FlowResolver {
    fn resolver(&mut self) -> &mut dyn FlowResolver;

    fn port_names(&self) -> Vec<String>;

    fn io_flow(&self) -> &[Real];

    fn io_flow_mut(&mut self) -> &mut [Real];

    /// Temperature of fluid leaving through `port` [°C].
    fn outlet_temperature(&self, port: &str) -> Option<Real>;

    /// Set the temperature of fluid entering through `port` [°C].
    fn set_port_temperature(&mut self, port: &str, t: Real) -> ComponentResult<()>;

    fn thermal(&self) -> Option<&dyn ThermalPart> {
        None
    }

    fn thermal_mut(&mut self) -> Option<&mut dyn ThermalPart> {
        None
    }
}
