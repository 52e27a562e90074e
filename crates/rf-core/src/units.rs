// rf-core/src/units.rs

use uom::si::f64::{Pressure as UomPressure, ThermodynamicTemperature as UomTemperature};

pub type Pressure = UomPressure;
pub type Temperature = UomTemperature;

/// Reference temperature for feeds without an explicit state (K).
pub const STANDARD_TEMPERATURE_K: f64 = 298.15;
/// Reference pressure for feeds without an explicit state (Pa).
pub const STANDARD_PRESSURE_PA: f64 = 101_325.0;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn to_pa(p: Pressure) -> f64 {
    use uom::si::pressure::pascal;
    p.get::<pascal>()
}

#[inline]
pub fn to_k(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_round_trip() {
        assert!((to_pa(pa(STANDARD_PRESSURE_PA)) - 101_325.0).abs() < 1e-9);
        assert!((to_k(k(STANDARD_TEMPERATURE_K)) - 298.15).abs() < 1e-9);
    }
}
