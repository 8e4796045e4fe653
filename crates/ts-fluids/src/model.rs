//! Fluid property trait.

use ts_core::Real;

/// Properties evaluated at a single temperature.
///
/// Batches the four properties the tank engine needs per cell so a backend
/// can share intermediate terms between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertyPack {
    /// Specific heat capacity [J/(kg·K)]
    pub cp: Real,
    /// Thermal conductivity [W/(m·K)]
    pub lambda: Real,
    /// Density [kg/m³]
    pub rho: Real,
    /// Kinematic viscosity [m²/s]
    pub nu: Real,
}

impl PropertyPack {
    /// Volumetric heat capacity ρ·cp [J/(m³·K)].
    pub fn rho_cp(&self) -> Real {
        self.rho * self.cp
    }

    /// Thermal diffusivity λ/(ρ·cp) [m²/s].
    pub fn diffusivity(&self) -> Real {
        self.lambda / self.rho_cp()
    }

    /// Prandtl number ν/a.
    pub fn prandtl(&self) -> Real {
        self.nu / self.diffusivity()
    }
}

/// Temperature-dependent property closure.
///
/// Temperatures are in °C. Implementations are pure functions of temperature;
/// callers evaluate them once per cell and step.
pub trait FluidProperties: Send + Sync {
    /// Model name (for debugging/logging).
    fn name(&self) -> &str;

    fn cp(&self, t: Real) -> Real;

    fn lambda(&self, t: Real) -> Real;

    fn rho(&self, t: Real) -> Real;

    fn nu(&self, t: Real) -> Real;

    /// Volumetric thermal expansion coefficient β = −(1/ρ)·∂ρ/∂T [1/K].
    ///
    /// Default uses a central difference on `rho`; models with an analytic
    /// derivative override it.
    fn beta(&self, t: Real) -> Real {
        const H: Real = 1e-3;
        let rho = self.rho(t);
        -(self.rho(t + H) - self.rho(t - H)) / (2.0 * H * rho)
    }

    /// Evaluate all four properties at `t`.
    fn pack(&self, t: Real) -> PropertyPack {
        PropertyPack {
            cp: self.cp(t),
            lambda: self.lambda(t),
            rho: self.rho(t),
            nu: self.nu(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    impl FluidProperties for Constant {
        fn name(&self) -> &str {
            "constant"
        }
        fn cp(&self, _t: Real) -> Real {
            4000.0
        }
        fn lambda(&self, _t: Real) -> Real {
            0.6
        }
        fn rho(&self, t: Real) -> Real {
            1000.0 - 0.5 * t
        }
        fn nu(&self, _t: Real) -> Real {
            1e-6
        }
    }

    #[test]
    fn derived_numbers() {
        let pack = Constant.pack(0.0);
        assert_eq!(pack.rho_cp(), 4.0e6);
        assert!((pack.diffusivity() - 1.5e-7).abs() < 1e-18);
        assert!((pack.prandtl() - 1e-6 / 1.5e-7).abs() < 1e-9);
    }

    #[test]
    fn default_beta_from_density_slope() {
        let beta = Constant.beta(0.0);
        assert!((beta - 0.5 / 1000.0).abs() < 1e-9);
    }
}
