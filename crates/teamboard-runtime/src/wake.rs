#![forbid(unsafe_code)]

//! Interruptible sleep for the poll loop.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Wake flag shared between the poll loop and any number of wakers.
///
/// [`wake`](Self::wake) sets the flag from any thread; the loop's
/// [`wait_timeout`](Self::wait_timeout) returns early when the flag is set
/// and clears it, so one wake ends exactly one wait.
#[derive(Debug, Clone, Default)]
pub struct WakeSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl WakeSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt the current or next wait.
    pub fn wake(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Whether a wake is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep up to `duration` or until woken.
    ///
    /// Returns `true` if woken, `false` if the timeout elapsed. Spurious
    /// condvar wakeups resume the wait for the remaining time.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut woken = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let deadline = Instant::now() + duration;
        loop {
            if *woken {
                *woken = false;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            woken = cvar
                .wait_timeout(woken, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn times_out_without_wake() {
        let signal = WakeSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn pending_wake_returns_immediately_and_is_consumed() {
        let signal = WakeSignal::new();
        signal.wake();
        assert!(signal.is_pending());
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        assert!(!signal.is_pending());
        assert!(!signal.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn wake_from_other_thread_interrupts_wait() {
        let signal = WakeSignal::new();
        let waker = signal.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            waker.wake();
        });
        let start = Instant::now();
        assert!(signal.wait_timeout(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }
}
