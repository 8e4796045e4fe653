//! Tank geometry and derived material constants.
//!
//! Construction fixes the cylinder and its cell grid ([`Geometry`]);
//! initialization adds the insulation layer ([`InsulatedShell`]). Both are
//! read-only afterwards.

use std::f64::consts::PI;

use crate::common::{require_non_negative, require_positive, require_present};
use crate::error::{ComponentError, ComponentResult};
use crate::ports::PortExtension;
use ts_core::numeric::{Real, series};
use ts_core::units::{Length, Volume, m};

/// Upper sanity bound for the shell thickness [m].
pub const MAX_SHELL_THICKNESS: Real = 1.0;

/// Shell material of the tank wall.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallMaterial {
    /// Thermal conductivity [W/(m·K)]
    pub lambda: Real,
    /// Density [kg/m³]
    pub rho: Real,
    /// Specific heat capacity [J/(kg·K)]
    pub cp: Real,
}

impl Default for WallMaterial {
    /// Unalloyed carbon steel.
    fn default() -> Self {
        Self {
            lambda: 50.0,
            rho: 7850.0,
            cp: 500.0,
        }
    }
}

/// Pipe stub attached at every port.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortGeometry {
    pub inner_diameter: Length,
    pub wall_thickness: Length,
}

impl Default for PortGeometry {
    fn default() -> Self {
        Self {
            inner_diameter: m(0.05),
            wall_thickness: m(0.002),
        }
    }
}

/// Construction parameters of a stratified tank.
///
/// Required fields are optional here so that a missing value is reported as
/// a configuration error naming the field.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TesConfig {
    pub volume: Option<Volume>,
    pub grid_points: Option<u32>,
    pub outer_diameter: Option<Length>,
    pub shell_thickness: Option<Length>,
    /// Ports beyond the default `in`/`out` pair; `None` is rejected.
    pub new_ports: Option<PortExtension>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub wall: WallMaterial,
    #[cfg_attr(feature = "serde", serde(default))]
    pub port_geometry: PortGeometry,
}

impl TesConfig {
    /// Complete configuration with the default ports only.
    pub fn new(volume: Volume, grid_points: u32, outer_diameter: Length, shell_thickness: Length) -> Self {
        Self {
            volume: Some(volume),
            grid_points: Some(grid_points),
            outer_diameter: Some(outer_diameter),
            shell_thickness: Some(shell_thickness),
            new_ports: Some(PortExtension::NoExtension),
            wall: WallMaterial::default(),
            port_geometry: PortGeometry::default(),
        }
    }

    pub fn with_ports(mut self, ports: PortExtension) -> Self {
        self.new_ports = Some(ports);
        self
    }

    pub fn with_wall(mut self, wall: WallMaterial) -> Self {
        self.wall = wall;
        self
    }
}

/// Inner-convection run length over tank height, `(1.077/1.615)³`.
pub const RUN_LENGTH_FACTOR: Real = 0.296_571_579_304_063_3;

/// Fixed geometry of the cylinder and its cell grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub grid_points: usize,
    pub volume: Real,
    pub outer_diameter: Real,
    pub shell_thickness: Real,
    /// Kept as `d_o − s_shell`; see the regression test below.
    pub inner_diameter: Real,
    /// Fluid cross-section A_cell [m²]
    pub cross_section: Real,
    pub cell_volume: Real,
    pub length: Real,
    pub grid_spacing: Real,
    /// Inner lateral shell area of one cell [m²]
    pub inner_lateral_area: Real,
    /// Outer lateral shell area of one cell [m²]
    pub outer_lateral_area: Real,
    pub shell_cross_section: Real,
    pub lateral_shell_volume: Real,
    /// Volume of one end cap [m³]
    pub cap_volume: Real,
    pub wall: WallMaterial,
    /// Wall m·cp per cell from the lateral shell only, uniform [J/K]
    pub wall_heat_capacity: Vec<Real>,
    /// Constant axial conductance through the shell between two cells [W/K]
    pub wall_axial_conductance: Real,
    /// Characteristic length of the outer vertical surface of one cell.
    /// For a vertical cylinder this is the cell height.
    pub flow_length: Vec<Real>,
    /// Run length for the inner convection correlation, per cell.
    ///
    /// Identical for every cell: the tank height scaled by
    /// [`RUN_LENGTH_FACTOR`] so the local Hausen form yields the mean Nusselt
    /// number over a short tank with varying flow.
    pub dist_from_start: Vec<Real>,
    pub port_fluid_area: Real,
    pub port_wall_area: Real,
}

impl Geometry {
    /// Derive the geometry from a construction config.
    pub fn from_config(config: &TesConfig) -> ComponentResult<Self> {
        let volume = require_positive(require_present(config.volume, "volume")?.value, "volume")?;
        let grid_points = require_present(config.grid_points, "grid_points")?;
        if grid_points == 0 {
            return Err(ComponentError::configuration("grid_points must be positive"));
        }
        let outer_diameter = require_positive(
            require_present(config.outer_diameter, "outer_diameter")?.value,
            "outer_diameter",
        )?;
        let shell_thickness = require_positive(
            require_present(config.shell_thickness, "shell_thickness")?.value,
            "shell_thickness",
        )?;
        if shell_thickness >= MAX_SHELL_THICKNESS {
            return Err(ComponentError::configuration(format!(
                "shell_thickness must be below {MAX_SHELL_THICKNESS} m (got {shell_thickness})"
            )));
        }
        if shell_thickness >= outer_diameter {
            return Err(ComponentError::configuration(
                "shell_thickness must be smaller than outer_diameter",
            ));
        }
        let wall = config.wall;
        require_positive(wall.lambda, "wall lambda")?;
        require_positive(wall.rho, "wall density")?;
        require_positive(wall.cp, "wall cp")?;
        let port_d = require_positive(config.port_geometry.inner_diameter.value, "port diameter")?;
        let port_s =
            require_non_negative(config.port_geometry.wall_thickness.value, "port wall thickness")?;

        let n = grid_points as usize;
        let inner_diameter = outer_diameter - shell_thickness;
        let cross_section = PI * inner_diameter.powi(2) / 4.0;
        let cell_volume = volume / n as Real;
        let length = volume / cross_section;
        let grid_spacing = length / n as Real;

        let shell_cross_section = PI / 4.0 * (outer_diameter.powi(2) - inner_diameter.powi(2));
        let lateral_shell_volume = shell_cross_section * grid_spacing;
        let cap_volume = PI * outer_diameter.powi(2) / 4.0 * shell_thickness;

        let wall_heat_capacity = vec![lateral_shell_volume * wall.rho * wall.cp; n];

        let port_outer = port_d + 2.0 * port_s;
        Ok(Self {
            grid_points: n,
            volume,
            outer_diameter,
            shell_thickness,
            inner_diameter,
            cross_section,
            cell_volume,
            length,
            grid_spacing,
            inner_lateral_area: PI * inner_diameter * grid_spacing,
            outer_lateral_area: PI * outer_diameter * grid_spacing,
            shell_cross_section,
            lateral_shell_volume,
            cap_volume,
            wall,
            wall_heat_capacity,
            wall_axial_conductance: wall.lambda * shell_cross_section / grid_spacing,
            flow_length: vec![grid_spacing; n],
            dist_from_start: vec![length * RUN_LENGTH_FACTOR; n],
            port_fluid_area: PI * port_d.powi(2) / 4.0,
            port_wall_area: PI / 4.0 * (port_outer.powi(2) - port_d.powi(2)),
        })
    }

    pub fn inner_radius(&self) -> Real {
        self.inner_diameter / 2.0
    }

    pub fn outer_radius(&self) -> Real {
        self.outer_diameter / 2.0
    }

    /// Total shell volume: lateral over all cells plus both caps.
    pub fn shell_volume(&self) -> Real {
        self.lateral_shell_volume * self.grid_points as Real + 2.0 * self.cap_volume
    }

    /// Conductance of the port pipe wall into the cell centre [W/K].
    pub fn port_wall_conductance(&self) -> Real {
        self.wall.lambda * self.port_wall_area / (self.grid_spacing / 2.0)
    }

    /// Port conductance: port wall in series with the fluid column of the port.
    pub fn port_conductance(&self, lambda_fluid: Real) -> Real {
        let fluid = lambda_fluid * self.port_fluid_area / (self.grid_spacing / 2.0);
        series(self.port_wall_conductance(), fluid)
    }
}

/// Shell resistances referenced to the inner radius, fixed at initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct InsulatedShell {
    pub insulation_thickness: Real,
    pub insulation_lambda: Real,
    /// r_i · ln(r_o / r_i) / λ_wall
    pub wall_resistance: Real,
    /// r_i · ln(r_tot / r_o) / λ_ins; infinite for a non-conducting layer.
    pub insulation_resistance: Real,
    /// d_o/2 + s_ins
    pub total_radius: Real,
    /// Conduction resistance of one lid (shell plus insulation) [m²K/W]
    pub lid_resistance: Real,
}

impl InsulatedShell {
    pub fn new(geometry: &Geometry, thickness: Real, lambda: Real) -> ComponentResult<Self> {
        let thickness = require_non_negative(thickness, "insulation_thickness")?;
        let lambda = require_non_negative(lambda, "insulation_lambda")?;
        let r_i = geometry.inner_radius();
        let r_o = geometry.outer_radius();
        let total_radius = r_o + thickness;
        let insulation_resistance = layer(thickness, lambda, r_i * (total_radius / r_o).ln());
        Ok(Self {
            insulation_thickness: thickness,
            insulation_lambda: lambda,
            wall_resistance: r_i * (r_o / r_i).ln() / geometry.wall.lambda,
            insulation_resistance,
            total_radius,
            lid_resistance: geometry.shell_thickness / geometry.wall.lambda
                + layer(thickness, lambda, thickness),
        })
    }

    /// Lateral conductance of one cell to ambient [W/K].
    pub fn lateral_conductance(&self, geometry: &Geometry, alpha_inner: Real, alpha_outer: Real) -> Real {
        let r_i = geometry.inner_radius();
        let resistance = 1.0 / alpha_inner
            + self.wall_resistance
            + self.insulation_resistance
            + r_i / (self.total_radius * alpha_outer);
        conductance(geometry.inner_lateral_area, resistance)
    }

    /// Conductance of one lid to ambient [W/K].
    pub fn lid_conductance(&self, geometry: &Geometry, alpha_inner: Real, alpha_lid: Real) -> Real {
        let resistance = 1.0 / alpha_inner + self.lid_resistance + 1.0 / alpha_lid;
        conductance(geometry.cross_section, resistance)
    }

    /// Area over perimeter of the insulated lid.
    pub fn lid_flow_length(&self) -> Real {
        self.total_radius / 2.0
    }
}

/// Resistance of an insulation layer; zero when absent, infinite when it does
/// not conduct.
fn layer(thickness: Real, lambda: Real, numerator: Real) -> Real {
    if thickness == 0.0 {
        0.0
    } else if lambda == 0.0 {
        Real::INFINITY
    } else {
        numerator / lambda
    }
}

fn conductance(area: Real, resistance: Real) -> Real {
    if resistance.is_finite() && resistance > 0.0 {
        area / resistance
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::units::m3;
    use ts_core::{Tolerances, nearly_equal};

    fn config() -> TesConfig {
        TesConfig::new(m3(1.0), 5, m(1.0), m(0.005))
    }

    #[test]
    fn inner_diameter_subtracts_one_shell_thickness() {
        let g = Geometry::from_config(&config()).unwrap();
        assert_eq!(g.inner_diameter, 0.995);
    }

    #[test]
    fn closure_and_lengths() {
        let g = Geometry::from_config(&config()).unwrap();
        let tol = Tolerances::default();
        assert!(nearly_equal(g.cross_section * g.length, 1.0, tol));
        assert!(nearly_equal(g.grid_spacing * 5.0, g.length, tol));
        assert_eq!(g.wall_heat_capacity.len(), 5);
        assert!(g.flow_length.iter().all(|&x| x == g.grid_spacing));
        let run = g.length * (1.077_f64 / 1.615).powi(3);
        assert!(g.dist_from_start.iter().all(|&x| nearly_equal(x, run, tol)));
        let loose = Tolerances {
            abs: 1e-6,
            rel: 0.0,
        };
        assert!(nearly_equal(g.dist_from_start[0] / g.length, 0.296_572, loose));
    }

    #[test]
    fn wall_heat_capacity_is_uniform_over_cells() {
        let g = Geometry::from_config(&config()).unwrap();
        let per_cell = WallMaterial::default().rho
            * WallMaterial::default().cp
            * g.shell_cross_section
            * g.length
            / 5.0;
        let tol = Tolerances::default();
        assert!(g.wall_heat_capacity.iter().all(|&c| nearly_equal(c, per_cell, tol)));
        assert_eq!(g.wall_heat_capacity[0], g.wall_heat_capacity[2]);
    }

    #[test]
    fn rejects_bad_construction_inputs() {
        let mut c = config();
        c.volume = None;
        assert!(matches!(
            Geometry::from_config(&c),
            Err(ComponentError::Configuration { .. })
        ));

        let mut c = config();
        c.grid_points = Some(0);
        assert!(Geometry::from_config(&c).is_err());

        let mut c = config();
        c.shell_thickness = Some(m(1.0));
        assert!(Geometry::from_config(&c).is_err());

        let mut c = config();
        c.outer_diameter = Some(m(f64::NAN));
        assert!(Geometry::from_config(&c).is_err());
    }

    #[test]
    fn insulation_layers() {
        let g = Geometry::from_config(&config()).unwrap();
        let bare = InsulatedShell::new(&g, 0.0, 0.0).unwrap();
        assert_eq!(bare.insulation_resistance, 0.0);
        assert_eq!(bare.total_radius, 0.5);

        let dead = InsulatedShell::new(&g, 0.1, 0.0).unwrap();
        assert_eq!(dead.lateral_conductance(&g, 100.0, 5.0), 0.0);

        let insulated = InsulatedShell::new(&g, 0.05, 0.04).unwrap();
        let ua_bare = bare.lateral_conductance(&g, 100.0, 5.0);
        let ua_ins = insulated.lateral_conductance(&g, 100.0, 5.0);
        assert!(ua_ins < ua_bare && ua_ins > 0.0);

        assert!(InsulatedShell::new(&g, -0.01, 0.04).is_err());
        assert!(InsulatedShell::new(&g, 0.01, -0.04).is_err());
    }

    #[test]
    fn lid_without_outer_convection_is_adiabatic() {
        let g = Geometry::from_config(&config()).unwrap();
        let shell = InsulatedShell::new(&g, 0.05, 0.04).unwrap();
        assert_eq!(shell.lid_conductance(&g, 100.0, 0.0), 0.0);
        assert!(shell.lid_conductance(&g, 100.0, 5.0) > 0.0);
    }
}
