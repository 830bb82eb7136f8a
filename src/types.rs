// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation from the (simulated) ROBD2 device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiveSample {
    pub timestamp: DateTime<Utc>,
    pub altitude: f64, // ft
    pub o2_conc: f64,  // %
    pub blp: f64,      // mmHg
    pub spo2: f64,     // %
    pub pulse: f64,    // bpm
    pub o2_voltage: Option<f64>,
    pub error_percent: Option<f64>,
}

impl LiveSample {
    pub fn value(&self, field: SampleField) -> f64 {
        match field {
            SampleField::Altitude => self.altitude,
            SampleField::O2Conc => self.o2_conc,
            SampleField::Blp => self.blp,
            SampleField::Spo2 => self.spo2,
            SampleField::Pulse => self.pulse,
            SampleField::O2Voltage => self.o2_voltage.unwrap_or(0.0),
            SampleField::ErrorPercent => self.error_percent.unwrap_or(0.0),
        }
    }
}

/// Selects one numeric channel of a `LiveSample`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleField {
    Altitude,
    O2Conc,
    Blp,
    Spo2,
    Pulse,
    O2Voltage,
    ErrorPercent,
}

impl SampleField {
    pub fn label(self) -> &'static str {
        match self {
            SampleField::Altitude => "Altitude (ft)",
            SampleField::O2Conc => "O2 Concentration (%)",
            SampleField::Blp => "BLP (mmHg)",
            SampleField::Spo2 => "SpO2 (%)",
            SampleField::Pulse => "Pulse (bpm)",
            SampleField::O2Voltage => "O2 Voltage (V)",
            SampleField::ErrorPercent => "Error (%)",
        }
    }
}

/// Point of a chart series: seconds since session start and the channel value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataPoint {
    pub time: f64,
    pub value: f64,
}

/// Outcome of `connect` / `disconnect`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Snapshot handed to the connection page.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub port: Option<String>,
    pub thread_alive: bool,
    pub poll_interval_sec: f64,
    pub sample_age_sec: Option<f64>,
    pub attempt_age_sec: Option<f64>,
    pub consecutive_errors: u32,
}
