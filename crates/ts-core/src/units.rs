// ts-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, MassRate as UomMassRate,
    ThermalConductivity as UomThermalConductivity, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Length = UomLength;
pub type MassRate = UomMassRate;
pub type ThermalConductivity = UomThermalConductivity;
pub type Volume = UomVolume;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn w_per_mk(v: f64) -> ThermalConductivity {
    use uom::si::thermal_conductivity::watt_per_meter_kelvin;
    ThermalConductivity::new::<watt_per_meter_kelvin>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

pub mod constants {
    pub const G0_MPS2: f64 = 9.806_65;

    /// Offset between the Celsius and Kelvin scales.
    pub const ZERO_CELSIUS_K: f64 = 273.15;

    #[inline]
    pub fn celsius_to_kelvin(t_c: f64) -> f64 {
        t_c + ZERO_CELSIUS_K
    }
}
