//! Background delivery of alert lines to a user callback.
//!
//! Alerts are queued on a bounded channel and handed to the callback on one
//! worker thread, so the logging call never waits for the callback. Queued
//! alerts are delivered before [`AlertDispatcher::shutdown`] returns; alerts
//! submitted while the queue is full are dropped.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError, bounded};

/// Callback receiving each fully rendered alert line.
pub type AlertFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Alerts waiting for the worker before new ones are dropped.
pub const QUEUE_CAPACITY: usize = 1024;

/// Outcome of handing an alert to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    Queued,
    /// The queue was full.
    Dropped,
    /// The dispatcher has been shut down.
    Closed,
}

struct Worker {
    sender: Sender<String>,
    handle: JoinHandle<()>,
}

pub struct AlertDispatcher {
    worker: Mutex<Option<Worker>>,
}

impl AlertDispatcher {
    pub fn spawn(callback: AlertFn) -> std::io::Result<Self> {
        Self::with_capacity(callback, QUEUE_CAPACITY)
    }

    pub fn with_capacity(callback: AlertFn, capacity: usize) -> std::io::Result<Self> {
        let (sender, receiver) = bounded::<String>(capacity);
        let handle = thread::Builder::new()
            .name("rotalog-alert".to_string())
            .spawn(move || {
                for line in receiver {
                    let callback = &callback;
                    if panic::catch_unwind(AssertUnwindSafe(|| callback(&line))).is_err() {
                        tracing::warn!("alert callback panicked");
                    }
                }
            })?;

        Ok(Self {
            worker: Mutex::new(Some(Worker { sender, handle })),
        })
    }

    /// Queue `line` without blocking.
    pub fn submit(&self, line: String) -> Submit {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(worker) = worker.as_ref() else {
            return Submit::Closed;
        };
        match worker.sender.try_send(line) {
            Ok(()) => Submit::Queued,
            Err(TrySendError::Full(_)) => Submit::Dropped,
            Err(TrySendError::Disconnected(_)) => Submit::Closed,
        }
    }

    /// Stop accepting alerts and wait until every queued one was delivered.
    pub fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Worker { sender, handle }) = worker {
            drop(sender);
            if handle.join().is_err() {
                tracing::warn!("alert worker exited abnormally");
            }
        }
    }
}

impl fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running = self
            .worker
            .lock()
            .map(|w| w.is_some())
            .unwrap_or(false);
        f.debug_struct("AlertDispatcher")
            .field("running", &running)
            .finish()
    }
}

impl Drop for AlertDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
