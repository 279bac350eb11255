use std::{
    sync::{Condvar, Mutex, PoisonError},
    time::{Duration, Instant},
};

/// A cancellation token, shared between a worker and whoever may want to
/// stop it early.
#[derive(Debug)]
pub struct CancellationToken {
    // Setting this to true marks the token as cancelled.
    mutex: Mutex<bool>,
    cvar: Condvar,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self {
            mutex: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }
}

impl CancellationToken {
    /// Mark the [`CancellationToken`] as cancelled.
    ///
    /// This is idempotent, and once cancelled, will stay cancelled. Sending it
    /// again will not do anything.
    pub fn cancel(&self) {
        let mut guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);

        if !*guard {
            *guard = true;
            self.cvar.notify_all();
        }
    }

    /// Whether the token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for `duration` unless cancelled first.
    ///
    /// Returns whether the token is cancelled after either sleeping or being
    /// woken up.
    pub fn sleep_with_cancellation(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.mutex.lock().unwrap_or_else(PoisonError::into_inner);

        // Spurious wakeups are possible, so keep waiting out the remainder.
        while !*guard {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            guard = self
                .cvar
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        *guard
    }
}
