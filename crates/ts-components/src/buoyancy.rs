//! Buoyancy-driven mixing between vertically adjacent cells.
//!
//! Two independent mechanisms:
//! - an exchange flow across a face where the upper cell is denser than the
//!   lower one, from an internal-wave estimate;
//! - a boost of the fluid conductance across a face where the lower cell is
//!   warmer, from horizontal-plate free convection.

use tracing::debug;

use ts_core::numeric::{Real, gradient, moving_average};
use ts_core::units::constants::G0_MPS2;
use ts_fluids::PropertyPack;

/// Moving-average window for the smoothed density profile.
pub fn smoothing_window(n: usize) -> usize {
    if n > 19 {
        n / 4
    } else if n > 8 {
        n / 2
    } else {
        3
    }
}

/// Integration constant of the thermal shape model, `((3m/a)³·4)^¼ / 4`
/// with m = 2.54 and a = 1.9.
const SHAPE_CONSTANT: Real = 1.001_973_035_683_131_3;

/// Reduced gravity below this magnitude counts as no inversion [m/s²].
const INVERSION_THRESHOLD: Real = 1e-14;

/// Exchange flow [kg/s] across one face with an unstable density step.
///
/// The lower cell's fluid displaces the cell above it. `n_bv` is the
/// Brunt–Väisälä frequency at the lower cell; the rising parcel has the
/// reference radius `d_i/16` and the flow is the RMS over the step of the
/// peak parcel velocity times the cell cross section. Returns `None` when the
/// closed form is not finite, which happens once `ω·dt` passes π/2.
pub fn exchange_flow(
    rho_upper: Real,
    rho_lower: Real,
    n_bv: Real,
    cross_section: Real,
    inner_diameter: Real,
    dt: Real,
) -> Option<Real> {
    // Negative when the upper cell is denser.
    let reduced_gravity = G0_MPS2 * (rho_lower - rho_upper) / rho_upper;
    if reduced_gravity > -INVERSION_THRESHOLD {
        return Some(0.0);
    }
    let n_bv = if n_bv == 0.0 { 1e-300 } else { n_bv };
    let omega = (2.0_f64 / 3.0).sqrt() * n_bv;
    let r0 = inner_diameter / 16.0;
    let b = (2.0_f64 / 3.0).sqrt() * r0.powi(3) * reduced_gravity / n_bv;
    let phase = omega * dt;
    let displacement = (-b * phase.cos() / omega).powf(0.25);
    let velocity = SHAPE_CONSTANT * omega * phase.tan() * displacement;
    let flow = (velocity * cross_section * rho_lower / std::f64::consts::SQRT_2).abs();
    flow.is_finite().then_some(flow)
}

/// Result of one pass over all faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExchangePass {
    /// Flow per face; face `f` lies between cells `f` and `f + 1`.
    pub faces: Vec<Real>,
    /// Faces whose flow was not finite and was set to zero.
    pub anomalies: usize,
}

impl ExchangePass {
    pub fn max(&self) -> Real {
        self.faces.iter().copied().fold(0.0, Real::max)
    }
}

/// Exchange flows for a top-to-bottom density profile.
///
/// The density gradient is smoothed over [`smoothing_window`] cells before
/// the stability frequency is taken.
pub fn exchange_flows(
    rho: &[Real],
    grid_spacing: Real,
    cross_section: Real,
    inner_diameter: Real,
    dt: Real,
) -> ExchangePass {
    let n = rho.len();
    if n < 2 {
        return ExchangePass::default();
    }
    let mut slope = vec![0.0; n];
    gradient(rho, grid_spacing, &mut slope);
    let mut smooth = vec![0.0; n];
    moving_average(&slope, smoothing_window(n), &mut smooth);

    let mut pass = ExchangePass {
        faces: vec![0.0; n - 1],
        anomalies: 0,
    };
    for f in 0..n - 1 {
        let (upper, lower) = (rho[f], rho[f + 1]);
        if upper <= lower {
            continue;
        }
        let n_bv = (G0_MPS2 * smooth[f + 1] / lower).abs().sqrt();
        match exchange_flow(upper, lower, n_bv, cross_section, inner_diameter, dt) {
            Some(flow) => pass.faces[f] = flow,
            None => {
                pass.anomalies += 1;
                debug!(face = f, n_bv, dt, "non-finite buoyant exchange flow suppressed");
            }
        }
    }
    pass
}

/// Multiplier on the fluid conductance across a face with the warmer cell below.
///
/// `pack` and `beta` are evaluated at the lower cell, `length` is the plate
/// length scale. Returns 1 when no boost applies.
pub fn convection_boost(pack: &PropertyPack, beta: Real, delta_t: Real, length: Real) -> Real {
    let pr = pack.prandtl();
    let ra = G0_MPS2 * beta.abs() * delta_t.abs() * length.powi(3) / (pack.nu * pack.diffusivity());
    let f2 = (1.0 + (0.322 / pr).powf(11.0 / 20.0)).powf(-20.0 / 11.0);
    let nu = if ra * f2 <= 7.0e4 {
        0.766 * (ra * f2).powf(0.2)
    } else {
        0.15 * (ra * f2).powf(1.0 / 3.0)
    };
    if nu.is_finite() && nu >= 1.0 { 20.0 * nu } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;
    use ts_core::numeric::{Tolerances, nearly_equal};
    use ts_fluids::{FluidProperties, Water};

    const TOL: Tolerances = Tolerances {
        abs: 1e-9,
        rel: 1e-9,
    };

    fn profile(temps: &[Real]) -> Vec<Real> {
        temps.iter().map(|&t| Water.rho(t)).collect()
    }

    #[test]
    fn windows() {
        assert_eq!(smoothing_window(40), 10);
        assert_eq!(smoothing_window(20), 5);
        assert_eq!(smoothing_window(12), 6);
        assert_eq!(smoothing_window(5), 3);
    }

    #[test]
    fn stable_stratification_has_no_exchange() {
        let rho = profile(&[60.0, 50.0, 40.0, 30.0, 20.0]);
        let pass = exchange_flows(&rho, 0.25, FRAC_PI_4, 1.0, 10.0);
        assert!(pass.faces.iter().all(|&f| f == 0.0));
        assert_eq!(pass.anomalies, 0);
    }

    #[test]
    fn inversion_gives_positive_flow_at_that_face() {
        let rho = profile(&[20.0, 20.0, 60.0, 60.0, 60.0]);
        let pass = exchange_flows(&rho, 0.25, FRAC_PI_4, 1.0, 1.0);
        assert!(nearly_equal(pass.faces[1], 8.575_458_567_492, TOL));
        assert_eq!(pass.faces[0], 0.0);
        assert_eq!(pass.faces[2], 0.0);
        assert_eq!(pass.max(), pass.faces[1]);
    }

    #[test]
    fn two_cell_inversion_magnitude() {
        // 20 °C water over 60 °C water in a 1 m tank.
        let rho = profile(&[20.0, 60.0]);
        let pass = exchange_flows(&rho, 0.25, FRAC_PI_4, 1.0, 1.0);
        assert!(nearly_equal(pass.faces[0], 20.834_299_133_892, TOL));
    }

    #[test]
    fn closed_form_reference_value() {
        let flow = exchange_flow(1000.0, 990.0, 0.5, FRAC_PI_4, 1.0, 1.0).unwrap();
        assert!(nearly_equal(flow, 9.419_357_031_829, TOL));
    }

    #[test]
    fn phase_past_quarter_period_is_an_anomaly() {
        // ω·dt ≈ 1.63 > π/2 turns the quarter-power base negative.
        assert_eq!(exchange_flow(1000.0, 990.0, 2.0, FRAC_PI_4, 1.0, 1.0), None);
        assert_eq!(exchange_flow(990.0, 1000.0, 2.0, FRAC_PI_4, 1.0, 1.0), Some(0.0));

        let rho = profile(&[20.0, 60.0]);
        let pass = exchange_flows(&rho, 0.25, FRAC_PI_4, 1.0, 3.0);
        assert_eq!(pass.faces, vec![0.0]);
        assert_eq!(pass.anomalies, 1);
    }

    #[test]
    fn boost_only_for_vigorous_convection() {
        let pack = Water.pack(40.0);
        let beta = Water.beta(40.0);
        assert_eq!(convection_boost(&pack, beta, 0.0, 0.25), 1.0);
        assert!(convection_boost(&pack, beta, 10.0, 0.25) > 20.0);
    }
}
