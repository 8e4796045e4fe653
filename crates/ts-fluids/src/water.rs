//! Liquid water at atmospheric pressure.
//!
//! Polynomial fits valid from 0 °C to 100 °C. Density follows the UNESCO
//! pure-water polynomial, which places the density maximum near 3.98 °C;
//! viscosity follows the Vogel-type fit `μ = A·10^(B/(T − C))`.

use crate::model::FluidProperties;
use ts_core::Real;
use ts_core::constants::celsius_to_kelvin;

const RHO: [Real; 6] = [
    999.842_594,
    6.793_952e-2,
    -9.095_290e-3,
    1.001_685e-4,
    -1.120_083e-6,
    6.536_332e-9,
];

const CP: [Real; 5] = [
    4216.923_776,
    -3.048_607,
    7.966_230e-2,
    -8.323_427e-4,
    3.400_350e-6,
];

const LAMBDA: [Real; 4] = [0.560_519_6, 2.086_301e-3, -8.374_709e-6, -6.662_782e-9];

fn poly(coeffs: &[Real], t: Real) -> Real {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Liquid water property model.
#[derive(Clone, Copy, Debug, Default)]
pub struct Water;

impl Water {
    /// Dynamic viscosity [Pa·s].
    pub fn mu(&self, t: Real) -> Real {
        2.414e-5 * 10.0_f64.powf(247.8 / (celsius_to_kelvin(t) - 140.0))
    }
}

impl FluidProperties for Water {
    fn name(&self) -> &str {
        "water"
    }

    fn cp(&self, t: Real) -> Real {
        poly(&CP, t)
    }

    fn lambda(&self, t: Real) -> Real {
        poly(&LAMBDA, t)
    }

    fn rho(&self, t: Real) -> Real {
        poly(&RHO, t)
    }

    fn nu(&self, t: Real) -> Real {
        self.mu(t) / self.rho(t)
    }

    fn beta(&self, t: Real) -> Real {
        let slope = RHO
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (i, c)| acc * t + i as Real * c);
        -slope / self.rho(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_values_at_20c() {
        let w = Water;
        assert!((w.rho(20.0) - 998.21).abs() < 0.05);
        assert!((w.cp(20.0) - 4182.0).abs() < 5.0);
        assert!((w.lambda(20.0) - 0.60).abs() < 0.02);
        assert!((w.mu(20.0) - 1.0e-3).abs() < 3e-5);
    }

    #[test]
    fn density_maximum_near_four_degrees() {
        let w = Water;
        assert!(w.rho(4.0) > w.rho(0.0));
        assert!(w.rho(4.0) > w.rho(8.0));
        assert!(w.beta(1.0) < 0.0);
        assert!(w.beta(10.0) > 0.0);
    }

    #[test]
    fn analytic_beta_matches_difference_quotient() {
        let w = Water;
        let h = 1e-4;
        let fd = -(w.rho(40.0 + h) - w.rho(40.0 - h)) / (2.0 * h * w.rho(40.0));
        assert!((w.beta(40.0) - fd).abs() < 1e-8);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn properties_physical_over_range(t in 0.0_f64..100.0) {
            let pack = Water.pack(t);
            prop_assert!(pack.rho > 955.0 && pack.rho < 1000.0);
            prop_assert!(pack.cp > 4170.0 && pack.cp < 4230.0);
            prop_assert!(pack.lambda > 0.55 && pack.lambda < 0.70);
            prop_assert!(pack.nu > 2.5e-7 && pack.nu < 2.0e-6);
        }
    }
}
