// src/gas.rs
//! Gas budgeting for hypoxia training sessions.
//!
//! Volumes are m³. Air is consumed for the hypoxic segment, nitrogen is 5 %
//! of the air volume, oxygen is consumed during recovery. All three scale
//! with the ventilation rate at the simulated altitude.
use serde::Serialize;

use crate::physiology::ventilation_rate;

pub const NITROGEN_FRACTION_OF_AIR: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasPrices {
    pub air: f64,
    pub nitrogen: f64,
    pub oxygen: f64,
}

/// Per-session volumes for one student.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SessionVolumes {
    air: f64,
    nitrogen: f64,
    oxygen: f64,
}

impl SessionVolumes {
    fn at(altitude_ft: f64, session_min: f64, recovery_min: f64) -> Self {
        let ventilation = ventilation_rate(altitude_ft);
        let air = ventilation * session_min / 1000.0;
        Self {
            air,
            nitrogen: air * NITROGEN_FRACTION_OF_AIR,
            oxygen: ventilation * recovery_min / 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasConsumptionInput {
    pub students_per_week: u32,
    pub weeks: u32,
    pub session_duration_min: f64,
    pub recovery_duration_min: f64,
    pub altitude_ft: f64,
    pub prices: GasPrices,
    /// Fractional reserve, e.g. 0.1 for 10 %.
    pub contingency: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GasConsumption {
    pub weekly_air_m3: f64,
    pub weekly_nitrogen_m3: f64,
    pub weekly_oxygen_m3: f64,
    pub total_air_m3: f64,
    pub total_nitrogen_m3: f64,
    pub total_oxygen_m3: f64,
    pub total_cost_air: f64,
    pub total_cost_nitrogen: f64,
    pub total_cost_oxygen: f64,
    pub total_cost: f64,
    pub total_cost_with_contingency: f64,
}

pub fn gas_consumption(input: &GasConsumptionInput) -> GasConsumption {
    let session = SessionVolumes::at(
        input.altitude_ft,
        input.session_duration_min,
        input.recovery_duration_min,
    );
    let students = input.students_per_week as f64;
    let weeks = input.weeks as f64;

    let weekly_air_m3 = session.air * students;
    let weekly_nitrogen_m3 = session.nitrogen * students;
    let weekly_oxygen_m3 = session.oxygen * students;
    let total_air_m3 = weekly_air_m3 * weeks;
    let total_nitrogen_m3 = weekly_nitrogen_m3 * weeks;
    let total_oxygen_m3 = weekly_oxygen_m3 * weeks;

    let total_cost_air = total_air_m3 * input.prices.air;
    let total_cost_nitrogen = total_nitrogen_m3 * input.prices.nitrogen;
    let total_cost_oxygen = total_oxygen_m3 * input.prices.oxygen;
    let total_cost = total_cost_air + total_cost_nitrogen + total_cost_oxygen;

    GasConsumption {
        weekly_air_m3,
        weekly_nitrogen_m3,
        weekly_oxygen_m3,
        total_air_m3,
        total_nitrogen_m3,
        total_oxygen_m3,
        total_cost_air,
        total_cost_nitrogen,
        total_cost_oxygen,
        total_cost,
        total_cost_with_contingency: total_cost * (1.0 + input.contingency),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CylinderCapacity {
    pub air_per_session_m3: f64,
    pub nitrogen_per_session_m3: f64,
    pub oxygen_per_session_m3: f64,
    pub max_students_air: u32,
    pub max_students_nitrogen: u32,
    pub max_students_oxygen: u32,
    pub max_students: u32,
}

fn students_supported(cylinder_m3: f64, per_session_m3: f64) -> u32 {
    if per_session_m3 > 0.0 {
        (cylinder_m3 / per_session_m3).floor().max(0.0) as u32
    } else {
        0
    }
}

/// How many students one set of cylinders covers.
pub fn cylinder_capacity(
    air_cyl_m3: f64,
    nitrogen_cyl_m3: f64,
    oxygen_cyl_m3: f64,
    session_duration_min: f64,
    recovery_duration_min: f64,
    altitude_ft: f64,
) -> CylinderCapacity {
    let session = SessionVolumes::at(altitude_ft, session_duration_min, recovery_duration_min);
    let max_students_air = students_supported(air_cyl_m3, session.air);
    let max_students_nitrogen = students_supported(nitrogen_cyl_m3, session.nitrogen);
    let max_students_oxygen = students_supported(oxygen_cyl_m3, session.oxygen);
    CylinderCapacity {
        air_per_session_m3: session.air,
        nitrogen_per_session_m3: session.nitrogen,
        oxygen_per_session_m3: session.oxygen,
        max_students_air,
        max_students_nitrogen,
        max_students_oxygen,
        max_students: max_students_air
            .min(max_students_nitrogen)
            .min(max_students_oxygen),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SingleSessionCost {
    pub air_consumed_m3: f64,
    pub nitrogen_consumed_m3: f64,
    pub oxygen_consumed_m3: f64,
    pub cost_air: f64,
    pub cost_nitrogen: f64,
    pub cost_oxygen: f64,
    pub total_cost: f64,
}

pub fn single_session(
    session_duration_min: f64,
    recovery_duration_min: f64,
    altitude_ft: f64,
    prices: GasPrices,
) -> SingleSessionCost {
    let session = SessionVolumes::at(altitude_ft, session_duration_min, recovery_duration_min);
    let cost_air = session.air * prices.air;
    let cost_nitrogen = session.nitrogen * prices.nitrogen;
    let cost_oxygen = session.oxygen * prices.oxygen;
    SingleSessionCost {
        air_consumed_m3: session.air,
        nitrogen_consumed_m3: session.nitrogen,
        oxygen_consumed_m3: session.oxygen,
        cost_air,
        cost_nitrogen,
        cost_oxygen,
        total_cost: cost_air + cost_nitrogen + cost_oxygen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: GasPrices = GasPrices {
        air: 10.0,
        nitrogen: 20.0,
        oxygen: 30.0,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_session_at_sea_level() {
        // 6 L/min at sea level.
        let cost = single_session(30.0, 10.0, 0.0, PRICES);
        assert!(close(cost.air_consumed_m3, 0.18));
        assert!(close(cost.nitrogen_consumed_m3, 0.009));
        assert!(close(cost.oxygen_consumed_m3, 0.06));
        assert!(close(cost.total_cost, 1.8 + 0.18 + 1.8));
    }

    #[test]
    fn consumption_scales_with_students_and_weeks() {
        let input = GasConsumptionInput {
            students_per_week: 4,
            weeks: 3,
            session_duration_min: 30.0,
            recovery_duration_min: 10.0,
            altitude_ft: 0.0,
            prices: PRICES,
            contingency: 0.1,
        };
        let out = gas_consumption(&input);
        assert!(close(out.weekly_air_m3, 0.72));
        assert!(close(out.total_air_m3, 2.16));
        assert!(close(out.total_oxygen_m3, 0.72));
        assert!(close(out.total_cost_with_contingency, out.total_cost * 1.1));
    }

    #[test]
    fn cylinder_capacity_takes_the_limiting_gas() {
        let cap = cylinder_capacity(1.0, 1.0, 0.1, 30.0, 10.0, 0.0);
        assert_eq!(cap.max_students_air, 5);
        assert_eq!(cap.max_students_nitrogen, 111);
        assert_eq!(cap.max_students_oxygen, 1);
        assert_eq!(cap.max_students, 1);
    }

    #[test]
    fn zero_duration_supports_no_students() {
        let cap = cylinder_capacity(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(cap.max_students, 0);
    }
}
