use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Ctrl+C flag the poll loop and the attach retries sleep on.
pub struct ShutdownSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    pub fn trigger(&self) {
        if let Ok(mut stopped) = self.stopped.lock() {
            *stopped = true;
        }
        self.wake.notify_all();
    }

    /// A poisoned lock counts as stopped.
    pub fn is_shutdown(&self) -> bool {
        self.stopped.lock().map_or(true, |stopped| *stopped)
    }

    /// Sleep for `duration`; true when woken by [`ShutdownSignal::trigger`].
    pub fn wait(&self, duration: Duration) -> bool {
        let Ok(stopped) = self.stopped.lock() else {
            return true;
        };
        self.wake
            .wait_timeout_while(stopped, duration, |stopped| !*stopped)
            .map_or(true, |(stopped, _)| *stopped)
    }
}
