use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::service::buffer::SampleBuffer;
use crate::service::connection::{self, ConnectionState};
use crate::service::generator::SampleGenerator;
use crate::service::stats::{box_plot, compute_stats, histogram, to_csv, Histogram, PerformanceStats, Quartiles};
use crate::types::{ActionResult, ConnectionStatus, DataPoint, LiveSample, SampleField};

/// Called with every sample as it lands in the buffer.
pub type SampleListener = Box<dyn FnMut(&LiveSample) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Simulated ROBD2 front end: generator, sample history, link state and
/// subscribers. One instance per dashboard; share it as `SharedService`.
pub struct DataService {
    buffer: SampleBuffer,
    generator: SampleGenerator,
    connection: ConnectionState,
    listeners: Vec<(SubscriptionId, SampleListener)>,
    next_listener_id: u64,
}

impl DataService {
    pub fn new(buffer_capacity: usize) -> Self {
        Self::with_generator(buffer_capacity, SampleGenerator::new())
    }

    pub fn with_generator(buffer_capacity: usize, generator: SampleGenerator) -> Self {
        Self {
            buffer: SampleBuffer::with_capacity(buffer_capacity),
            generator,
            connection: ConnectionState::default(),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    // ---- connection ----

    pub fn connect(&mut self, port: &str) -> ActionResult {
        self.connection.connected = true;
        self.connection.port = Some(port.to_owned());
        self.connection.consecutive_errors = 0;
        info!("connected to simulated ROBD2 on {port}");
        ActionResult::ok("Connected to ROBD2 device (Demo Mode)")
    }

    pub fn disconnect(&mut self) -> ActionResult {
        self.connection.connected = false;
        info!("disconnected from simulated ROBD2");
        ActionResult::ok("Disconnected from device")
    }

    pub fn is_connected(&self) -> bool {
        self.connection.connected
    }

    pub fn available_ports(&self) -> Vec<String> {
        connection::available_ports()
    }

    pub fn set_poll_interval_sec(&mut self, seconds: f64) {
        self.connection.poll_interval_sec = seconds;
    }

    pub fn connection_status(&self, thread_alive: bool) -> ConnectionStatus {
        self.connection.status_at(thread_alive, Utc::now())
    }

    pub fn connection_status_at(&self, thread_alive: bool, now: DateTime<Utc>) -> ConnectionStatus {
        self.connection.status_at(thread_alive, now)
    }

    // ---- sampling ----

    /// One poll cycle: generate, store, notify. Returns the stored sample.
    pub fn tick(&mut self) -> LiveSample {
        let sample = self.generator.generate();
        self.accept(&sample)
    }

    /// Stores an externally produced sample as if it came from the device.
    pub fn accept(&mut self, sample: &LiveSample) -> LiveSample {
        let stored = self.buffer.push(sample);
        self.connection.last_sample_at = Some(stored.timestamp);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&stored);
        }
        stored
    }

    /// Listeners run on the polling thread while the service is locked; they
    /// must not lock the service again.
    pub fn subscribe(&mut self, listener: SampleListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // ---- queries ----

    pub fn samples(&self) -> Vec<LiveSample> {
        self.buffer.all()
    }

    pub fn sample_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn latest_sample(&self) -> Option<LiveSample> {
        self.buffer.latest().cloned()
    }

    pub fn time_series(&self, field: SampleField) -> Vec<DataPoint> {
        self.buffer.time_series(field)
    }

    pub fn performance_stats(&self) -> Option<PerformanceStats> {
        compute_stats(&self.buffer.all())
    }

    fn field_values(&self, field: SampleField) -> Vec<f64> {
        self.buffer.iter().map(|s| s.value(field)).collect()
    }

    pub fn histogram(&self, field: SampleField, bins: usize) -> Option<Histogram> {
        histogram(&self.field_values(field), bins)
    }

    pub fn box_plot(&self, field: SampleField) -> Option<Quartiles> {
        box_plot(&self.field_values(field))
    }

    /// Empty string when there is nothing buffered.
    pub fn export_csv(&self) -> String {
        match self.buffer.session_start() {
            Some(start) => to_csv(&self.buffer.all(), start),
            None => String::new(),
        }
    }

    pub fn generator_altitude(&self) -> f64 {
        self.generator.current_altitude()
    }

    /// Empties the history and puts the simulated flight back on the ground.
    pub fn clear_data(&mut self) {
        debug!("clearing {} buffered samples", self.buffer.len());
        self.buffer.clear();
        self.generator.reset();
    }
}

impl Default for DataService {
    fn default() -> Self {
        Self::new(crate::service::buffer::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::stats::CSV_HEADER;
    use std::sync::mpsc::channel;

    fn service() -> DataService {
        DataService::with_generator(2000, SampleGenerator::seeded(42))
    }

    #[test]
    fn connect_and_disconnect_always_succeed() {
        let mut svc = service();
        let result = svc.connect("COM3");
        assert!(result.success);
        assert!(svc.is_connected());
        assert_eq!(svc.connection_status(false).port.as_deref(), Some("COM3"));

        let result = svc.disconnect();
        assert!(result.success);
        assert!(!svc.is_connected());
        assert_eq!(svc.connection_status(false).port, None);
    }

    #[test]
    fn tick_stores_and_notifies() {
        let mut svc = service();
        let (tx, rx) = channel();
        svc.subscribe(Box::new(move |s: &LiveSample| {
            tx.send(s.clone()).ok();
        }));
        let stored = svc.tick();
        assert_eq!(rx.try_recv().ok(), Some(stored.clone()));
        assert_eq!(svc.latest_sample(), Some(stored.clone()));
        assert_eq!(svc.sample_count(), 1);
        let status = svc.connection_status_at(true, stored.timestamp);
        assert_eq!(status.sample_age_sec, Some(0.0));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut svc = service();
        let (tx, rx) = channel();
        let id = svc.subscribe(Box::new(move |s: &LiveSample| {
            tx.send(s.altitude).ok();
        }));
        svc.tick();
        assert!(svc.unsubscribe(id));
        assert!(!svc.unsubscribe(id));
        svc.tick();
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn stats_and_export_follow_the_buffer() {
        let mut svc = service();
        assert!(svc.performance_stats().is_none());
        assert_eq!(svc.export_csv(), "");

        svc.tick();
        assert!(svc.performance_stats().is_none());
        svc.tick();
        let stats = svc.performance_stats().unwrap();
        assert_eq!(stats.samples, 2);

        let csv = svc.export_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn distributions_follow_the_buffer() {
        let mut svc = DataService::with_generator(10, SampleGenerator::seeded(7));
        assert_eq!(svc.buffer_capacity(), 10);
        assert!(svc.histogram(SampleField::O2Conc, 20).is_none());
        for _ in 0..4 {
            svc.tick();
        }
        assert!(svc.box_plot(SampleField::Spo2).is_none());
        svc.tick();
        let q = svc.box_plot(SampleField::Spo2).unwrap();
        assert!(q.min <= q.q1 && q.q1 <= q.median && q.median <= q.q3 && q.q3 <= q.max);

        for _ in 0..20 {
            svc.tick();
        }
        let h = svc.histogram(SampleField::O2Conc, 20).unwrap();
        assert_eq!(h.counts.iter().sum::<usize>(), svc.buffer_capacity());
    }

    #[test]
    fn clear_data_resets_buffer_and_walk() {
        let mut svc = service();
        for _ in 0..10 {
            svc.tick();
        }
        svc.clear_data();
        assert_eq!(svc.sample_count(), 0);
        assert!(svc.latest_sample().is_none());
        assert_eq!(svc.generator_altitude(), 0.0);
        assert_eq!(svc.export_csv(), "");

        svc.tick();
        let series = svc.time_series(SampleField::Altitude);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].time, 0.0);
    }

    #[test]
    fn buffered_samples_respect_validation_ranges() {
        let mut svc = DataService::with_generator(50, SampleGenerator::seeded(1));
        for _ in 0..500 {
            svc.tick();
        }
        let samples = svc.samples();
        assert_eq!(samples.len(), 50);
        for s in samples {
            assert!(crate::limits::VALIDATION_SPO2.contains(s.spo2));
            assert!(crate::limits::VALIDATION_PULSE.contains(s.pulse));
            assert!(crate::limits::VALIDATION_O2_CONC.contains(s.o2_conc));
            assert!(crate::limits::VALIDATION_ALTITUDE.contains(s.altitude));
        }
    }
}
