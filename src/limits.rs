// src/limits.rs
//! Value ranges shared by the generator, the sample buffer and the UI.

/// Closed interval used for clamping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

// Buffer-level validation, applied on every push.
pub const VALIDATION_SPO2: Bounds = Bounds::new(50.0, 100.0);
pub const VALIDATION_O2_CONC: Bounds = Bounds::new(0.0, 100.0);
pub const VALIDATION_PULSE: Bounds = Bounds::new(20.0, 220.0);
pub const VALIDATION_ALTITUDE: Bounds = Bounds::new(0.0, 35000.0);

// Generator-level bounds. Narrower than (or equal to) the validation ranges.
pub const GENERATOR_ALTITUDE: Bounds = VALIDATION_ALTITUDE;
pub const GENERATOR_SPO2: Bounds = VALIDATION_SPO2;
pub const GENERATOR_PULSE: Bounds = Bounds::new(40.0, 180.0);
/// Lowest O2 fraction the simulated breathing gas reaches.
pub const GENERATOR_O2_FLOOR: f64 = 4.0;
/// Altitude at which the random walk is forced back down.
pub const GENERATOR_CEILING_FT: f64 = 30000.0;

/// Severity of a displayed vital sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

pub struct Spo2Range {
    pub warning: f64,
    pub critical: f64,
}

pub struct PulseRange {
    pub warning: f64,
}

pub struct AltitudeRange {
    pub warning: f64,
    pub critical: f64,
}

pub struct SafeRanges {
    pub spo2: Spo2Range,
    pub pulse: PulseRange,
    pub altitude: AltitudeRange,
}

/// Operational thresholds for the dashboard cards.
pub const SAFE_RANGES: SafeRanges = SafeRanges {
    spo2: Spo2Range {
        warning: 88.0,
        critical: 85.0,
    },
    pulse: PulseRange { warning: 120.0 },
    altitude: AltitudeRange {
        warning: 25000.0,
        critical: 30000.0,
    },
};

/// Critical below 85 %, warning in `[85, 88)`.
pub fn spo2_alert(spo2: f64) -> AlertLevel {
    let r = &SAFE_RANGES.spo2;
    if spo2 < r.critical {
        AlertLevel::Critical
    } else if spo2 < r.warning {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

/// Pulse only ever warns, above 120 bpm.
pub fn pulse_alert(pulse: f64) -> AlertLevel {
    if pulse > SAFE_RANGES.pulse.warning {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

/// Warning above 25000 ft, critical from 30000 ft.
pub fn altitude_alert(altitude_ft: f64) -> AlertLevel {
    let r = &SAFE_RANGES.altitude;
    if altitude_ft >= r.critical {
        AlertLevel::Critical
    } else if altitude_ft > r.warning {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}
