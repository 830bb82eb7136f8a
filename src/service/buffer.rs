use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use log::debug;

use crate::limits::{VALIDATION_ALTITUDE, VALIDATION_O2_CONC, VALIDATION_PULSE, VALIDATION_SPO2};
use crate::types::{DataPoint, LiveSample, SampleField};

pub const DEFAULT_CAPACITY: usize = 2000;

/// Reapplies the hard validation ranges; the generator already clamps but the
/// buffer does not trust its producer.
pub fn validate_sample(sample: &LiveSample) -> LiveSample {
    LiveSample {
        spo2: VALIDATION_SPO2.clamp(sample.spo2),
        o2_conc: VALIDATION_O2_CONC.clamp(sample.o2_conc),
        pulse: VALIDATION_PULSE.clamp(sample.pulse),
        altitude: VALIDATION_ALTITUDE.clamp(sample.altitude),
        ..sample.clone()
    }
}

/// Insertion-ordered sample history with FIFO eviction.
pub struct SampleBuffer {
    samples: VecDeque<LiveSample>,
    capacity: usize,
    session_start: Option<DateTime<Utc>>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            session_start: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the first sample pushed since the last `clear`.
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    /// Stores a clamped copy and returns it.
    pub fn push(&mut self, sample: &LiveSample) -> LiveSample {
        if self.session_start.is_none() {
            self.session_start = Some(sample.timestamp);
        }
        let validated = validate_sample(sample);
        if self.samples.len() == self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                debug!("buffer full, evicted sample from {}", evicted.timestamp);
            }
        }
        self.samples.push_back(validated.clone());
        validated
    }

    pub fn latest(&self) -> Option<&LiveSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveSample> {
        self.samples.iter()
    }

    /// Owned copy in insertion order.
    pub fn all(&self) -> Vec<LiveSample> {
        self.samples.iter().cloned().collect()
    }

    /// `(seconds since session start, value)` for every stored sample.
    pub fn time_series(&self, field: SampleField) -> Vec<DataPoint> {
        let Some(start) = self.session_start else {
            return Vec::new();
        };
        self.samples
            .iter()
            .map(|s| DataPoint {
                time: elapsed_seconds(start, s.timestamp),
                value: s.value(field),
            })
            .collect()
    }

    /// Drops every sample and forgets the session start.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.session_start = None;
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Millisecond-resolution elapsed time, in seconds.
pub fn elapsed_seconds(start: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    (at - start).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn sample_at(ts: DateTime<Utc>, altitude: f64) -> LiveSample {
        LiveSample {
            timestamp: ts,
            altitude,
            o2_conc: 20.9,
            blp: 5.2,
            spo2: 98.0,
            pulse: 72.0,
            o2_voltage: Some(2.09),
            error_percent: Some(0.1),
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut buffer = SampleBuffer::new();
        for i in 0..(DEFAULT_CAPACITY + 5) {
            buffer.push(&sample_at(t0() + Duration::seconds(i as i64), i as f64));
        }
        let all = buffer.all();
        assert_eq!(all.len(), DEFAULT_CAPACITY);
        assert_eq!(all[0].altitude, 5.0);
        assert!(all.iter().all(|s| s.altitude >= 5.0));
        assert_eq!(buffer.latest().map(|s| s.altitude), Some((DEFAULT_CAPACITY + 4) as f64));
        // insertion order is kept
        assert!(all.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn push_clamps_to_validation_ranges() {
        let mut buffer = SampleBuffer::with_capacity(4);
        let raw = LiveSample {
            timestamp: t0(),
            altitude: 40000.0,
            o2_conc: 120.0,
            blp: 5.0,
            spo2: 12.0,
            pulse: 300.0,
            o2_voltage: None,
            error_percent: None,
        };
        let stored = buffer.push(&raw);
        assert_eq!(stored.altitude, 35000.0);
        assert_eq!(stored.o2_conc, 100.0);
        assert_eq!(stored.spo2, 50.0);
        assert_eq!(stored.pulse, 220.0);
        assert_eq!(buffer.latest(), Some(&stored));

        let low = LiveSample {
            altitude: -10.0,
            o2_conc: -1.0,
            pulse: 3.0,
            ..raw
        };
        let stored = buffer.push(&low);
        assert_eq!(stored.altitude, 0.0);
        assert_eq!(stored.o2_conc, 0.0);
        assert_eq!(stored.pulse, 20.0);
    }

    #[test]
    fn empty_buffer_has_no_latest_or_series() {
        let buffer = SampleBuffer::new();
        assert!(buffer.latest().is_none());
        assert!(buffer.all().is_empty());
        assert!(buffer.time_series(SampleField::Spo2).is_empty());
    }

    #[test]
    fn time_series_is_relative_to_first_push() {
        let mut buffer = SampleBuffer::new();
        buffer.push(&sample_at(t0(), 100.0));
        buffer.push(&sample_at(t0() + Duration::milliseconds(2500), 200.0));
        let series = buffer.time_series(SampleField::Altitude);
        assert_eq!(
            series,
            vec![
                DataPoint { time: 0.0, value: 100.0 },
                DataPoint { time: 2.5, value: 200.0 },
            ]
        );
    }

    #[test]
    fn clear_resets_the_session_anchor() {
        let mut buffer = SampleBuffer::new();
        buffer.push(&sample_at(t0(), 100.0));
        buffer.push(&sample_at(t0() + Duration::seconds(10), 200.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.session_start().is_none());

        let later = t0() + Duration::seconds(60);
        buffer.push(&sample_at(later, 300.0));
        let series = buffer.time_series(SampleField::Altitude);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].time, 0.0);
        assert_eq!(buffer.session_start(), Some(later));
    }
}
