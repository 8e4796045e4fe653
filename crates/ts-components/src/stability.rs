//! Explicit-step stability check (von Neumann diffusion number and Courant number).

use ts_core::numeric::Real;

/// Outcome of one attempted step of one component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepVerdict {
    pub stable: bool,
    /// Step the component would accept; `None` when `stable`.
    pub proposed_dt: Option<Real>,
}

impl StepVerdict {
    pub const STABLE: StepVerdict = StepVerdict {
        stable: true,
        proposed_dt: None,
    };

    pub fn retry_with(dt: Real) -> Self {
        Self {
            stable: false,
            proposed_dt: Some(dt),
        }
    }

    /// Combine two verdicts: unstable wins, smallest proposal wins.
    pub fn fold(self, other: StepVerdict) -> StepVerdict {
        let proposed_dt = match (self.proposed_dt, other.proposed_dt) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        StepVerdict {
            stable: self.stable && other.stable,
            proposed_dt,
        }
    }

    pub fn reduce(verdicts: impl IntoIterator<Item = StepVerdict>) -> StepVerdict {
        verdicts.into_iter().fold(StepVerdict::STABLE, StepVerdict::fold)
    }
}

impl Default for StepVerdict {
    fn default() -> Self {
        Self::STABLE
    }
}

/// Ceilings of the explicit scheme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StabilityLimits {
    pub diffusion: Real,
    pub courant: Real,
    /// Safety factor applied to the proposed step.
    pub shrink: Real,
}

impl Default for StabilityLimits {
    fn default() -> Self {
        Self {
            diffusion: 0.5,
            courant: 1.0,
            shrink: 0.95,
        }
    }
}

/// Worst-case conductances of one component for the current step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StabilityInputs {
    pub max_cell_conductance: Real,
    pub max_port_conductance: Real,
    pub max_ambient_conductance: Real,
    /// Largest volumetric heat capacity over all cells [J/(m³·K)]
    pub max_rho_cp: Real,
    /// Largest inflow of a cell divided by its fluid mass [1/s]
    pub max_specific_inflow: Real,
    pub grid_spacing: Real,
    pub cross_section: Real,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Assessment {
    pub diffusion_number: Real,
    pub courant_number: Real,
    /// Largest number over its ceiling; above 1 means unstable.
    pub ratio: Real,
}

impl Assessment {
    pub fn breached(&self) -> bool {
        self.ratio > 1.0
    }

    /// Verdict for `dt`; the proposal scales `dt` back under every ceiling.
    pub fn verdict(&self, dt: Real, limits: &StabilityLimits) -> StepVerdict {
        if self.breached() {
            StepVerdict::retry_with(dt * limits.shrink / self.ratio)
        } else {
            StepVerdict::STABLE
        }
    }
}

pub fn assess(inputs: &StabilityInputs, dt: Real, limits: &StabilityLimits) -> Assessment {
    let ua = inputs
        .max_cell_conductance
        .max(inputs.max_port_conductance)
        .max(inputs.max_ambient_conductance);
    let capacity = inputs.grid_spacing * inputs.cross_section * inputs.max_rho_cp;
    let diffusion_number = if capacity > 0.0 { ua * dt / capacity } else { 0.0 };
    let courant_number = inputs.max_specific_inflow * dt;
    let ratio = (diffusion_number / limits.diffusion).max(courant_number / limits.courant);
    Assessment {
        diffusion_number,
        courant_number,
        ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> StabilityInputs {
        StabilityInputs {
            max_cell_conductance: 4.0,
            max_port_conductance: 0.5,
            max_ambient_conductance: 1.0,
            max_rho_cp: 4.0e6,
            max_specific_inflow: 0.01,
            grid_spacing: 0.25,
            cross_section: 1.0,
        }
    }

    #[test]
    fn small_step_is_stable() {
        let a = assess(&inputs(), 1.0, &StabilityLimits::default());
        assert!(!a.breached());
        assert_eq!(a.verdict(1.0, &StabilityLimits::default()), StepVerdict::STABLE);
    }

    #[test]
    fn courant_breach_proposes_shrunk_step() {
        let limits = StabilityLimits::default();
        let a = assess(&inputs(), 200.0, &limits);
        assert!((a.courant_number - 2.0).abs() < 1e-12);
        let v = a.verdict(200.0, &limits);
        assert!(!v.stable);
        let proposed = v.proposed_dt.unwrap();
        assert!((proposed - 200.0 * 0.95 / 2.0).abs() < 1e-9);
        assert!(!assess(&inputs(), proposed, &limits).breached());
    }

    #[test]
    fn identical_inputs_give_identical_verdicts() {
        let limits = StabilityLimits::default();
        let first = assess(&inputs(), 500.0, &limits).verdict(500.0, &limits);
        let second = assess(&inputs(), 500.0, &limits).verdict(500.0, &limits);
        assert_eq!(first, second);
    }

    #[test]
    fn reduction_takes_minimum() {
        let v = StepVerdict::reduce([
            StepVerdict::STABLE,
            StepVerdict::retry_with(3.0),
            StepVerdict::retry_with(1.5),
        ]);
        assert!(!v.stable);
        assert_eq!(v.proposed_dt, Some(1.5));
        assert_eq!(StepVerdict::reduce([]), StepVerdict::STABLE);
    }
}
