// cf-core/src/units.rs

use uom::si::f64::{
    Length as UomLength, MassDensity as UomMassDensity,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type Length = UomLength;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn g_per_cm3(v: f64) -> Density {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    Density::new::<gram_per_cubic_centimeter>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn yr(v: f64) -> Time {
    use uom::si::time::year;
    Time::new::<year>(v)
}

#[inline]
pub fn myr(v: f64) -> Time {
    yr(v * 1.0e6)
}

/// CGS magnitude of a density, as the rate physics consumes it.
#[inline]
pub fn density_cgs(rho: Density) -> f64 {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    rho.get::<gram_per_cubic_centimeter>()
}

#[inline]
pub fn seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

#[inline]
pub fn kelvin(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _t = k(1.0e4);
        let _rho = g_per_cm3(1.67e-24);
        let _dt = s(1.0);
    }

    #[test]
    fn myr_in_seconds() {
        let dt = seconds(myr(1.0));
        assert!((dt - 3.15e13).abs() / 3.15e13 < 0.01, "dt = {dt}");
    }

    #[test]
    fn density_roundtrip_cgs() {
        let rho = density_cgs(g_per_cm3(1.67e-24));
        assert!((rho - 1.67e-24).abs() < 1e-36);
    }
}
