use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use super::{LocationProvider, LocationUpdate};

/// Repeating location refresh with an owned handle. The first fix is taken
/// as soon as the thread starts, then one per `interval` until [`cancel`] is
/// called or the poller is dropped.
///
/// [`cancel`]: LocationPoller::cancel
pub struct LocationPoller {
    stop: Option<Sender<()>>,
    updates: Receiver<LocationUpdate>,
    handle: Option<JoinHandle<()>>,
}

impl LocationPoller {
    pub fn spawn<P>(provider: P, interval: Duration) -> io::Result<Self>
    where
        P: LocationProvider + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (update_tx, update_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("location-poller".to_string())
            .spawn(move || {
                loop {
                    let update = provider.locate();
                    if let Err(err) = &update {
                        warn!(error = %err, "location refresh failed");
                    }
                    if update_tx.send(update).is_err() {
                        break;
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("location poller stopped");
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            updates: update_rx,
            handle: Some(handle),
        })
    }

    /// Latest pending update, skipping any older ones still queued.
    pub fn latest(&self) -> Option<LocationUpdate> {
        self.updates.try_iter().last()
    }

    /// Block up to `timeout` for the next update.
    pub fn wait(&self, timeout: Duration) -> Option<LocationUpdate> {
        self.updates.recv_timeout(timeout).ok()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the timer and wait for the thread. Calling it twice is harmless.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("location poller panicked");
            }
        }
    }
}

impl Drop for LocationPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}
