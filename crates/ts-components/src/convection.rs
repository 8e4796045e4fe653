//! Heat transfer coefficients for the tank surfaces.
//!
//! Inner side: forced convection in a tube (Hausen laminar, Gnielinski
//! turbulent, linear blend in between). Outer side: free convection on the
//! vertical cylinder (Churchill–Chu) and on the two lids (horizontal plates).

use ts_core::numeric::Real;
use ts_core::units::constants::G0_MPS2;
use ts_fluids::{FluidProperties, PropertyPack};

pub const RE_LAMINAR: Real = 2300.0;
pub const RE_TURBULENT: Real = 1.0e4;

/// Laminar plate correlation switches to the turbulent form above this Ra.
const RA_PLATE_TURBULENT: Real = 1.0e7;

/// Hausen, thermally developing laminar flow. `x` is the run length.
pub fn hausen(re: Real, pr: Real, d: Real, x: Real) -> Real {
    let gz = re * pr * d / x;
    3.66 + 0.0668 * gz / (1.0 + 0.04 * gz.powf(2.0 / 3.0))
}

/// Gnielinski, smooth tube.
pub fn gnielinski(re: Real, pr: Real) -> Real {
    let f = (0.79 * re.ln() - 1.64).powi(-2);
    (f / 8.0) * (re - 1000.0) * pr / (1.0 + 12.7 * (f / 8.0).sqrt() * (pr.powf(2.0 / 3.0) - 1.0))
}

/// Tube Nusselt number over the full Reynolds range.
pub fn tube_nusselt(re: Real, pr: Real, d: Real, x: Real) -> Real {
    if re <= RE_LAMINAR {
        hausen(re, pr, d, x)
    } else if re >= RE_TURBULENT {
        gnielinski(re, pr)
    } else {
        let gamma = (re - RE_LAMINAR) / (RE_TURBULENT - RE_LAMINAR);
        (1.0 - gamma) * hausen(RE_LAMINAR, pr, d, x) + gamma * gnielinski(RE_TURBULENT, pr)
    }
}

/// Inner heat transfer coefficient of one cell [W/(m²·K)].
pub fn inner_alpha(pack: &PropertyPack, mass_flow: Real, d: Real, area: Real, x: Real) -> Real {
    let velocity = mass_flow.abs() / (pack.rho * area);
    let re = velocity * d / pack.nu;
    tube_nusselt(re, pack.prandtl(), d, x) * pack.lambda / d
}

/// Rayleigh number g·β·ΔT·L³/(ν·a).
pub fn rayleigh(pack: &PropertyPack, beta: Real, delta_t: Real, length: Real) -> Real {
    G0_MPS2 * beta.abs() * delta_t.abs() * length.powi(3) / (pack.nu * pack.diffusivity())
}

/// Churchill–Chu, vertical surface, full Ra range.
pub fn churchill_chu(ra: Real, pr: Real) -> Real {
    let shape = (1.0 + (0.492 / pr).powf(9.0 / 16.0)).powf(8.0 / 27.0);
    (0.825 + 0.387 * ra.powf(1.0 / 6.0) / shape).powi(2)
}

/// Which face of a horizontal plate the air sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlateFace {
    /// Upper face of a hot plate, or lower face of a cold one.
    Rising,
    /// Lower face of a hot plate, or upper face of a cold one.
    Stable,
}

pub fn plate_nusselt(ra: Real, face: PlateFace) -> Real {
    match face {
        PlateFace::Rising if ra > RA_PLATE_TURBULENT => 0.15 * ra.powf(1.0 / 3.0),
        PlateFace::Rising => 0.54 * ra.powf(0.25),
        PlateFace::Stable => 0.27 * ra.powf(0.25),
    }
}

/// The two lids of the cylinder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lid {
    Top,
    Bottom,
}

impl Lid {
    fn face(self, surface_warmer: bool) -> PlateFace {
        match (self, surface_warmer) {
            (Lid::Top, true) | (Lid::Bottom, false) => PlateFace::Rising,
            (Lid::Top, false) | (Lid::Bottom, true) => PlateFace::Stable,
        }
    }
}

/// Air properties at the film temperature.
fn film(air: &dyn FluidProperties, t_surface: Real, t_ambient: Real) -> (PropertyPack, Real) {
    let t_film = 0.5 * (t_surface + t_ambient);
    (air.pack(t_film), air.beta(t_film))
}

/// Outer free-convection coefficient of the vertical shell [W/(m²·K)].
pub fn outer_alpha(air: &dyn FluidProperties, t_surface: Real, t_ambient: Real, length: Real) -> Real {
    let (pack, beta) = film(air, t_surface, t_ambient);
    let ra = rayleigh(&pack, beta, t_surface - t_ambient, length);
    churchill_chu(ra, pack.prandtl()) * pack.lambda / length
}

/// Free-convection coefficient of a lid [W/(m²·K)]. Zero without a temperature difference.
pub fn lid_alpha(
    air: &dyn FluidProperties,
    lid: Lid,
    t_surface: Real,
    t_ambient: Real,
    length: Real,
) -> Real {
    let (pack, beta) = film(air, t_surface, t_ambient);
    let ra = rayleigh(&pack, beta, t_surface - t_ambient, length);
    plate_nusselt(ra, lid.face(t_surface > t_ambient)) * pack.lambda / length
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_fluids::{Air, Water};

    #[test]
    fn laminar_limit() {
        assert!((hausen(0.0, 5.0, 0.5, 1.0) - 3.66).abs() < 1e-12);
    }

    #[test]
    fn blend_is_continuous() {
        let (pr, d, x) = (4.0, 0.05, 2.0);
        let lo = tube_nusselt(RE_LAMINAR, pr, d, x);
        let just_above = tube_nusselt(RE_LAMINAR + 1e-6, pr, d, x);
        assert!((lo - just_above).abs() < 1e-6);
        let hi = tube_nusselt(RE_TURBULENT, pr, d, x);
        let just_below = tube_nusselt(RE_TURBULENT - 1e-6, pr, d, x);
        assert!((hi - just_below).abs() < 1e-4);
        assert!(hi > lo);
    }

    #[test]
    fn resting_water_uses_laminar_value() {
        let pack = Water.pack(50.0);
        let alpha = inner_alpha(&pack, 0.0, 1.0, 0.785, 1.3);
        assert!((alpha - 3.66 * pack.lambda).abs() < 1e-12);
    }

    #[test]
    fn outer_alpha_is_plausible() {
        let alpha = outer_alpha(&Air, 40.0, 20.0, 1.5);
        assert!(alpha > 1.0 && alpha < 10.0, "alpha = {alpha}");
    }

    #[test]
    fn lid_faces() {
        let hot_top = lid_alpha(&Air, Lid::Top, 60.0, 20.0, 0.25);
        let hot_bottom = lid_alpha(&Air, Lid::Bottom, 60.0, 20.0, 0.25);
        assert!(hot_top > hot_bottom);
        let cold_bottom = lid_alpha(&Air, Lid::Bottom, 5.0, 20.0, 0.25);
        let cold_top = lid_alpha(&Air, Lid::Top, 5.0, 20.0, 0.25);
        assert!(cold_bottom > cold_top);
        assert_eq!(lid_alpha(&Air, Lid::Top, 20.0, 20.0, 0.25), 0.0);
    }
}
