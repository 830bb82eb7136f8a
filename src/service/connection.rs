use chrono::{DateTime, Utc};

use crate::types::ConnectionStatus;

/// Ports offered by the simulated device picker.
pub const SIMULATED_PORTS: [&str; 5] = ["COM1", "COM3", "COM4", "/dev/ttyUSB0", "/dev/ttyACM0"];

pub const DEFAULT_POLL_INTERVAL_SEC: f64 = 2.0;

/// Link state of the (simulated) device.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionState {
    pub connected: bool,
    pub port: Option<String>,
    pub poll_interval_sec: f64,
    pub last_sample_at: Option<DateTime<Utc>>,
    // Never incremented by the simulator; kept for a real transport.
    pub consecutive_errors: u32,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connected: false,
            port: None,
            poll_interval_sec: DEFAULT_POLL_INTERVAL_SEC,
            last_sample_at: None,
            consecutive_errors: 0,
        }
    }
}

impl ConnectionState {
    pub fn status_at(&self, thread_alive: bool, now: DateTime<Utc>) -> ConnectionStatus {
        let sample_age_sec = self
            .last_sample_at
            .map(|at| (now - at).num_milliseconds() as f64 / 1000.0);
        ConnectionStatus {
            connected: self.connected,
            port: if self.connected { self.port.clone() } else { None },
            thread_alive,
            poll_interval_sec: self.poll_interval_sec,
            sample_age_sec,
            // no separate attempt clock without a real transport
            attempt_age_sec: sample_age_sec,
            consecutive_errors: self.consecutive_errors,
        }
    }
}

pub fn available_ports() -> Vec<String> {
    SIMULATED_PORTS.iter().map(|p| p.to_string()).collect()
}
