use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error};

use super::{Completion, Request};
use crate::db::ItemStore;
use crate::error::StoreError;

/// Background thread that owns the store and executes requests one at a time
/// in the order they were submitted. Completions come back on a channel and
/// are picked up by the UI loop, so the caller never blocks on SQLite.
pub struct StoreWorker {
    requests: Option<Sender<Request>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl StoreWorker {
    /// Move `store` onto a dedicated thread.
    pub fn spawn<S>(store: S) -> io::Result<Self>
    where
        S: ItemStore + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (completion_tx, completion_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("store-worker".to_string())
            .spawn(move || {
                for request in request_rx {
                    debug!(?request, "executing store request");
                    if completion_tx.send(request.execute(&store)).is_err() {
                        break;
                    }
                }
                debug!("store worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            completions: completion_rx,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    /// Queue a request. The in-memory view must not change until the matching
    /// completion has been applied.
    pub fn submit(&mut self, request: Request) -> Result<(), StoreError> {
        let sender = self.requests.as_ref().ok_or(StoreError::WorkerGone)?;
        sender.send(request).map_err(|_| {
            error!("store worker hung up");
            StoreError::WorkerGone
        })?;
        self.in_flight += 1;
        Ok(())
    }

    /// Next completion if one is ready.
    pub fn try_complete(&mut self) -> Option<Completion> {
        match self.completions.try_recv() {
            Ok(completion) => Some(self.settle(completion)),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block up to `timeout` for the next completion.
    pub fn wait(&mut self, timeout: Duration) -> Option<Completion> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Some(self.settle(completion)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Requests submitted but not yet handed back through
    /// [`try_complete`](Self::try_complete) or [`wait`](Self::wait).
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    fn settle(&mut self, completion: Completion) -> Completion {
        self.in_flight = self.in_flight.saturating_sub(1);
        completion
    }
}

impl Drop for StoreWorker {
    /// Closing the request channel ends the worker loop once the queue drains.
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("store worker panicked");
            }
        }
    }
}
