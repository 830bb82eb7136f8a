use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::service::buffer::elapsed_seconds;
use crate::types::LiveSample;

pub const CSV_HEADER: &str = "Time (s),Time (min),Altitude (ft),O2 Concentration (%),BLP (mmHg),SpO2 (%),Pulse (bpm),O2 Voltage (V),Error (%)";

/// Descriptive statistics for one channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divides by N).
    pub std_dev: f64,
    /// `100 * std / mean`, 0 when the mean is not positive.
    pub cv_percent: f64,
    pub min: f64,
    pub max: f64,
}

impl ChannelStats {
    /// `None` for fewer than two values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|v| {
                let delta = v - mean;
                delta * delta
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();
        let cv_percent = if mean > 0.0 { std_dev / mean * 100.0 } else { 0.0 };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count: values.len(),
            mean,
            std_dev,
            cv_percent,
            min,
            max,
        })
    }
}

/// Stats shown on the performance page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub samples: usize,
    pub o2: ChannelStats,
    pub spo2: ChannelStats,
}

/// `None` means "need at least 2 samples".
pub fn compute_stats(samples: &[LiveSample]) -> Option<PerformanceStats> {
    let o2: Vec<f64> = samples.iter().map(|s| s.o2_conc).collect();
    let spo2: Vec<f64> = samples.iter().map(|s| s.spo2).collect();
    Some(PerformanceStats {
        samples: samples.len(),
        o2: ChannelStats::from_values(&o2)?,
        spo2: ChannelStats::from_values(&spo2)?,
    })
}

/// Flight-data CSV, rows joined with `\n`. Empty string when there is nothing
/// to export.
pub fn to_csv(samples: &[LiveSample], session_start: DateTime<Utc>) -> String {
    if samples.is_empty() {
        return String::new();
    }
    let mut lines = Vec::with_capacity(samples.len() + 1);
    lines.push(CSV_HEADER.to_owned());
    for s in samples {
        let t = elapsed_seconds(session_start, s.timestamp);
        let cells = [
            to_fixed(t, 2),
            to_fixed(t / 60.0, 2),
            to_fixed(s.altitude, 1),
            to_fixed(s.o2_conc, 2),
            to_fixed(s.blp, 2),
            to_fixed(s.spo2, 2),
            to_fixed(s.pulse, 0),
            to_fixed(s.o2_voltage.unwrap_or(0.0), 3),
            to_fixed(s.error_percent.unwrap_or(0.0), 2),
        ];
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

const EXACT_TAIL_DIGITS: usize = 64;

/// Fixed-point text with exact halves rounded away from zero.
///
/// `format!("{:.N}")` rounds an exact binary midpoint (1.125, 88.5) to even;
/// exported files round it up instead.
pub fn to_fixed(value: f64, decimals: usize) -> String {
    if value.is_finite() && value != 0.0 && is_exact_midpoint(value, decimals) {
        // one ulp further from zero is past the midpoint
        return format!("{:.*}", decimals, f64::from_bits(value.to_bits() + 1));
    }
    format!("{:.*}", decimals, value)
}

fn is_exact_midpoint(value: f64, decimals: usize) -> bool {
    let digits = format!("{:.*}", decimals + 1 + EXACT_TAIL_DIGITS, value.abs());
    let tail = &digits[digits.len() - 1 - EXACT_TAIL_DIGITS..];
    tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0')
}

// ---- distributions ----

pub const O2_HISTOGRAM_BINS: usize = 20;
pub const SPO2_HISTOGRAM_BINS: usize = 15;
/// Fewest samples for which quartiles are reported.
pub const MIN_BOX_PLOT_SAMPLES: usize = 5;
/// O2 CV below this counts as consistent delivery.
pub const CONSISTENT_CV_PERCENT: f64 = 5.0;
pub const ADEQUATE_SAMPLE_COUNT: usize = 100;

/// Equal-width bins spanning `[min, max]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_center(&self, index: usize) -> f64 {
        self.min + (index as f64 + 0.5) * self.bin_width
    }
}

/// `None` for fewer than two values or zero bins. A flat series gets a bin
/// width of 1 so every value lands in the first bin.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.len() < 2 || bins == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;
    let bin_width = if width > 0.0 { width } else { 1.0 };
    let mut counts = vec![0; bins];
    for v in values {
        let index = (((v - min) / bin_width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    Some(Histogram {
        min,
        bin_width,
        counts,
    })
}

/// Five-number summary; quartiles are the sorted values at `floor(n * q)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Quartiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn box_plot(values: &[f64]) -> Option<Quartiles> {
    if values.len() < MIN_BOX_PLOT_SAMPLES {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let at = |q: f64| sorted[((n as f64 * q).floor() as usize).min(n - 1)];
    Some(Quartiles {
        min: sorted[0],
        q1: at(0.25),
        median: at(0.5),
        q3: at(0.75),
        max: sorted[n - 1],
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QualityAssessment {
    pub consistent: bool,
    pub adequate_samples: bool,
}

impl PerformanceStats {
    pub fn quality(&self) -> QualityAssessment {
        QualityAssessment {
            consistent: self.o2.cv_percent < CONSISTENT_CV_PERCENT,
            adequate_samples: self.samples >= ADEQUATE_SAMPLE_COUNT,
        }
    }
}
