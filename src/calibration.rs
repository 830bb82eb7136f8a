// src/calibration.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::LiveSample;

/// Pure-O2 readings below this are reported as this value.
pub const PURE_O2_MIN_PERCENT: f64 = 95.0;
pub const CALIBRATION_CSV_HEADER: &str = "type,o2_pct,adc";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub o2_percent: f64,
    pub adc_equivalent: f64,
}

/// Two-point O2 sensor calibration captured from live samples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    pub room_air: Option<CalibrationPoint>,
    pub pure_o2: Option<CalibrationPoint>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl CalibrationData {
    pub fn record_room_air(&mut self, sample: &LiveSample) -> CalibrationPoint {
        let point = CalibrationPoint {
            o2_percent: sample.o2_conc,
            adc_equivalent: sample.o2_conc / 10.0,
        };
        self.room_air = Some(point);
        self.recorded_at = Some(Utc::now());
        point
    }

    /// The simulated ADC sits one volt above the room-air scale.
    pub fn record_pure_o2(&mut self, sample: &LiveSample) -> CalibrationPoint {
        let point = CalibrationPoint {
            o2_percent: sample.o2_conc.max(PURE_O2_MIN_PERCENT),
            adc_equivalent: sample.o2_conc / 10.0 + 1.0,
        };
        self.pure_o2 = Some(point);
        self.recorded_at = Some(Utc::now());
        point
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_complete(&self) -> bool {
        self.room_air.is_some() && self.pure_o2.is_some()
    }

    /// O2 percent per ADC volt between the two points.
    pub fn slope(&self) -> Option<f64> {
        let (room, pure) = (self.room_air?, self.pure_o2?);
        let d_adc = pure.adc_equivalent - room.adc_equivalent;
        if d_adc.abs() < f64::EPSILON {
            return None;
        }
        Some((pure.o2_percent - room.o2_percent) / d_adc)
    }

    pub fn to_csv(&self) -> String {
        let mut lines = vec![CALIBRATION_CSV_HEADER.to_owned()];
        if let Some(p) = self.room_air {
            lines.push(format!("room_air,{},{}", p.o2_percent, p.adc_equivalent));
        }
        if let Some(p) = self.pure_o2 {
            lines.push(format!("pure_o2,{},{}", p.o2_percent, p.adc_equivalent));
        }
        lines.join("\n")
    }
}
