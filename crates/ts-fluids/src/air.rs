//! Dry air at atmospheric pressure (ideal gas, Sutherland viscosity).

use crate::model::FluidProperties;
use ts_core::Real;
use ts_core::constants::celsius_to_kelvin;

const P_ATM: Real = 101_325.0;
const R_AIR: Real = 287.058;
const MU_REF: Real = 1.716e-5;
const T_REF_K: Real = 273.15;
const SUTHERLAND_K: Real = 110.4;

/// Dry air property model.
#[derive(Clone, Copy, Debug, Default)]
pub struct Air;

impl FluidProperties for Air {
    fn name(&self) -> &str {
        "air"
    }

    fn cp(&self, t: Real) -> Real {
        1006.0 + 0.012 * t
    }

    fn lambda(&self, t: Real) -> Real {
        0.024_18 + 7.7e-5 * t
    }

    fn rho(&self, t: Real) -> Real {
        P_ATM / (R_AIR * celsius_to_kelvin(t))
    }

    fn nu(&self, t: Real) -> Real {
        let tk = celsius_to_kelvin(t);
        let mu = MU_REF * (tk / T_REF_K).powf(1.5) * (T_REF_K + SUTHERLAND_K) / (tk + SUTHERLAND_K);
        mu / self.rho(t)
    }

    fn beta(&self, t: Real) -> Real {
        1.0 / celsius_to_kelvin(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_values_at_20c() {
        let a = Air;
        assert!((a.rho(20.0) - 1.204).abs() < 0.005);
        assert!((a.nu(20.0) - 1.51e-5).abs() < 0.05e-5);
        assert!((a.lambda(20.0) - 0.0257).abs() < 0.001);
        let pr = a.pack(20.0).prandtl();
        assert!(pr > 0.69 && pr < 0.74, "Pr = {pr}");
    }
}
