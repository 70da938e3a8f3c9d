//! Interval scheduling for the polling loop
//!
//! [`Ticker::wait`] blocks for one interval, or returns early once a
//! [`ShutdownHandle`] asks the loop to stop.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Fixed-interval ticker with cooperative shutdown.
#[derive(Debug)]
pub struct Ticker {
    interval: Duration,
    state: Arc<State>,
}

/// Requests that a [`Ticker`] stop. Cloneable and usable from any thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    state: Arc<State>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Arc::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self
            .state
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for one interval.
    ///
    /// Returns `true` when the interval elapsed and the loop should go on,
    /// `false` as soon as shutdown has been requested.
    pub fn wait(&self) -> bool {
        let stopped = self
            .state
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (stopped, _) = self
            .state
            .wake
            .wait_timeout_while(stopped, self.interval, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);

        !*stopped
    }
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let mut stopped = self
            .state
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        self.state.wake.notify_all();
    }
}
