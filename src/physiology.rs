//! Altitude physiology used by the sample generator and the calculator page.
//!
//! - Barometric pressure: standard-atmosphere approximation,
//!   `P = 760 * (1 - 2.25577e-5 * h_m)^5.25588`.
//! - Alveolar O2: `PAO2 = (P - 47) * FiO2 - 5`, with 47 mmHg water vapour
//!   pressure and a fixed 5 mmHg A-a gradient.
//! - Saturation: Hill equation `100 * p^3 / (p^3 + K^3)`.
//!
//! Inputs are altitudes in feet, within 0..=35000 ft. Negative altitudes are
//! outside the troposphere approximation and must not be passed in.
use serde::Serialize;

pub const FEET_TO_METERS: f64 = 0.3048;
pub const SEA_LEVEL_PRESSURE_MMHG: f64 = 760.0;
/// Water vapour pressure at body temperature (mmHg).
pub const WATER_VAPOR_MMHG: f64 = 47.0;
/// Fraction of O2 in dry air.
pub const FIO2_AIR: f64 = 0.2095;
/// Alveolar-arterial gradient approximation (mmHg).
pub const AA_GRADIENT_MMHG: f64 = 5.0;
/// Half-saturation constant used by the sample generator's noise model.
pub const HILL_K_GENERATOR: f64 = 26.6;
/// Half-saturation constant used by the public physiology calculator.
pub const HILL_K_CALCULATOR: f64 = 150.0;

pub const BASE_VENTILATION_L_MIN: f64 = 6.0;
pub const MAX_VENTILATION_L_MIN: f64 = 60.0;
pub const BASE_HEART_RATE_BPM: f64 = 70.0;

pub fn feet_to_meters(altitude_ft: f64) -> f64 {
    altitude_ft * FEET_TO_METERS
}

/// Barometric pressure (mmHg) at `altitude_ft`.
pub fn barometric_pressure(altitude_ft: f64) -> f64 {
    let altitude_m = feet_to_meters(altitude_ft);
    SEA_LEVEL_PRESSURE_MMHG * (1.0 - 2.25577e-5 * altitude_m).powf(5.25588)
}

/// Inspired O2 partial pressure (mmHg) breathing air at `altitude_ft`.
pub fn inspired_o2(altitude_ft: f64) -> f64 {
    (barometric_pressure(altitude_ft) - WATER_VAPOR_MMHG) * FIO2_AIR
}

/// Alveolar O2 partial pressure (mmHg) at `altitude_ft`.
pub fn alveolar_o2(altitude_ft: f64) -> f64 {
    inspired_o2(altitude_ft) - AA_GRADIENT_MMHG
}

fn hill_saturation(pao2: f64, k: f64) -> f64 {
    let p3 = pao2.powi(3);
    100.0 * p3 / (p3 + k.powi(3))
}

/// Arterial saturation (%) with the calculator's constant (K = 150).
///
/// Not clamped; callers clamp when the value is shown as a vital sign.
pub fn arterial_saturation(pao2: f64) -> f64 {
    hill_saturation(pao2, HILL_K_CALCULATOR)
}

/// Arterial saturation (%) with the generator's constant (K = 26.6).
pub fn generator_saturation(pao2: f64) -> f64 {
    hill_saturation(pao2, HILL_K_GENERATOR)
}

/// Minute ventilation (L/min): 6 L/min at rest, +100% per 1000 m above
/// 1500 m, capped at 60 L/min.
pub fn ventilation_rate(altitude_ft: f64) -> f64 {
    let altitude_m = feet_to_meters(altitude_ft);
    let excess = (altitude_m - 1500.0).max(0.0);
    (BASE_VENTILATION_L_MIN * (1.0 + excess / 1000.0)).min(MAX_VENTILATION_L_MIN)
}

/// Heart rate (bpm): 70 plus 1 bpm per 100 m above 1000 m.
pub fn heart_rate_estimate(altitude_ft: f64) -> f64 {
    let altitude_m = feet_to_meters(altitude_ft);
    BASE_HEART_RATE_BPM + (altitude_m - 1000.0).max(0.0) / 100.0
}

/// Everything the physiology calculator shows for one altitude.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhysiologicalParams {
    pub altitude_ft: f64,
    pub altitude_m: f64,
    pub pressure_mmhg: f64,
    pub pao2: f64,
    pub sao2: f64,
    pub ventilation_rate_l_min: f64,
    pub heart_rate_bpm: f64,
}

pub fn physiological_params(altitude_ft: f64) -> PhysiologicalParams {
    let pao2 = alveolar_o2(altitude_ft);
    PhysiologicalParams {
        altitude_ft,
        altitude_m: feet_to_meters(altitude_ft),
        pressure_mmhg: barometric_pressure(altitude_ft),
        pao2,
        sao2: arterial_saturation(pao2),
        ventilation_rate_l_min: ventilation_rate(altitude_ft),
        heart_rate_bpm: heart_rate_estimate(altitude_ft),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_reference() {
        assert_eq!(barometric_pressure(0.0), 760.0);
        assert_eq!(ventilation_rate(0.0), 6.0);
        assert_eq!(heart_rate_estimate(0.0), 70.0);
    }

    #[test]
    fn pressure_strictly_decreases_with_altitude() {
        let mut previous = barometric_pressure(0.0);
        for step in 1..=350 {
            let p = barometric_pressure(step as f64 * 100.0);
            assert!(p < previous, "pressure did not drop at {} ft", step * 100);
            previous = p;
        }
    }

    #[test]
    fn ventilation_is_monotone_and_capped() {
        let mut previous = ventilation_rate(0.0);
        for step in 0..=700 {
            let v = ventilation_rate(step as f64 * 100.0);
            assert!(v >= previous);
            assert!(v <= MAX_VENTILATION_L_MIN);
            previous = v;
        }
        assert_eq!(ventilation_rate(1_000_000.0), MAX_VENTILATION_L_MIN);
    }

    #[test]
    fn alveolar_o2_at_25000_ft() {
        // (760 * (1 - 2.25577e-5 * 7620)^5.25588 - 47) * 0.2095 - 5
        let pao2 = alveolar_o2(25000.0);
        assert!((pao2 - 44.24).abs() < 0.01, "pao2 = {pao2}");
        assert!((barometric_pressure(25000.0) - 282.03).abs() < 0.01);
    }

    #[test]
    fn hill_constants_stay_distinct() {
        let pao2 = alveolar_o2(25000.0);
        let calc = arterial_saturation(pao2);
        let gen = generator_saturation(pao2);
        assert!((calc - 2.50).abs() < 0.01);
        assert!((gen - 82.14).abs() < 0.01);
    }

    #[test]
    fn params_bundle_matches_individual_functions() {
        let p = physiological_params(18000.0);
        assert_eq!(p.pressure_mmhg, barometric_pressure(18000.0));
        assert_eq!(p.pao2, alveolar_o2(18000.0));
        assert_eq!(p.sao2, arterial_saturation(p.pao2));
        assert!((p.altitude_m - 5486.4).abs() < 1e-9);
        assert!(p.heart_rate_bpm > BASE_HEART_RATE_BPM);
    }
}
