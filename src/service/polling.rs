use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::service::data_service::DataService;
use crate::service::error::DashboardError;
use crate::types::LiveSample;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Service handle shared by the polling worker and the UI.
pub type SharedService = Arc<Mutex<DataService>>;

pub fn shared(service: DataService) -> SharedService {
    Arc::new(Mutex::new(service))
}

/// Locks the service; a panicked tick does not take the dashboard down.
pub fn lock_service(service: &SharedService) -> MutexGuard<'_, DataService> {
    service.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Repeating timer that drives `DataService::tick`. At most one worker runs.
pub struct PollingController {
    service: SharedService,
    worker: Option<Worker>,
}

impl PollingController {
    pub fn new(service: SharedService) -> Self {
        Self {
            service,
            worker: None,
        }
    }

    pub fn service(&self) -> &SharedService {
        &self.service
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts ticking every `interval`. No-op while already running.
    pub fn start(&mut self, interval: Duration) -> Result<(), DashboardError> {
        if interval.is_zero() {
            return Err(DashboardError::InvalidPollInterval);
        }
        if self.worker.is_some() {
            return Ok(());
        }
        lock_service(&self.service).set_poll_interval_sec(interval.as_secs_f64());

        let (stop_tx, stop_rx) = channel::<()>();
        let service = Arc::clone(&self.service);
        let handle = thread::spawn(move || loop {
            // the receive timeout doubles as the timer
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    lock_service(&service).tick();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        info!("polling started every {} ms", interval.as_millis());
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// Cancels future ticks; an in-flight tick finishes first. No-op when idle.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.stop_tx.send(()).ok();
        if worker.handle.join().is_err() {
            warn!("polling worker panicked");
        }
        info!("polling stopped");
    }

    /// Runs one cycle on the calling thread.
    pub fn tick(&self) -> LiveSample {
        lock_service(&self.service).tick()
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::generator::SampleGenerator;

    fn controller() -> PollingController {
        PollingController::new(shared(DataService::with_generator(
            2000,
            SampleGenerator::seeded(9),
        )))
    }

    #[test]
    fn manual_tick_pushes_one_sample() {
        let ctl = controller();
        let sample = ctl.tick();
        let svc = lock_service(ctl.service());
        assert_eq!(svc.sample_count(), 1);
        assert_eq!(svc.latest_sample(), Some(sample));
    }

    #[test]
    fn worker_ticks_until_stopped() {
        let mut ctl = controller();
        ctl.start(Duration::from_millis(5)).unwrap();
        assert!(ctl.is_running());
        // second start is ignored
        ctl.start(Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(150));
        ctl.stop();
        assert!(!ctl.is_running());

        let after_stop = lock_service(ctl.service()).sample_count();
        assert!(after_stop > 0);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(lock_service(ctl.service()).sample_count(), after_stop);
        let status = lock_service(ctl.service()).connection_status(ctl.is_running());
        assert_eq!(status.poll_interval_sec, 0.005);
        assert!(!status.thread_alive);
    }

    #[test]
    fn stop_when_idle_is_a_no_op() {
        let mut ctl = controller();
        ctl.stop();
        assert!(!ctl.is_running());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut ctl = controller();
        assert!(matches!(
            ctl.start(Duration::ZERO),
            Err(DashboardError::InvalidPollInterval)
        ));
        assert!(!ctl.is_running());
    }
}
