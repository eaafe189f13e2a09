use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Timed sleep that can be cut short from another thread.
///
/// A wake only affects a sleeper that is already waiting; a wake issued while
/// nobody sleeps is dropped.
pub struct SleepGate {
    mutex: Mutex<GateState>,
    cv_wakeup: Condvar,
}

#[derive(Default)]
struct GateState {
    sleeping: bool,
    signaled: bool,
}

impl SleepGate {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(GateState::default()),
            cv_wakeup: Condvar::new(),
        }
    }

    /// Sleeps for at most `timeout`. Returns `true` if the sleep was ended by
    /// [`SleepGate::wake_one`].
    pub fn timed_wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.mutex.lock();
        guard.sleeping = true;
        guard.signaled = false;
        while !guard.signaled {
            if self.cv_wakeup.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        let woken = guard.signaled;
        guard.sleeping = false;
        guard.signaled = false;
        woken
    }

    pub fn wake_one(&self) {
        let mut guard = self.mutex.lock();
        if guard.sleeping {
            guard.signaled = true;
            self.cv_wakeup.notify_one();
        }
    }
}

impl Default for SleepGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn times_out_without_wake() {
        let gate = SleepGate::new();
        let start = Instant::now();
        assert!(!gate.timed_wait(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wake_cuts_sleep_short() {
        let gate = Arc::new(SleepGate::new());
        let sleeper = {
            let gate = gate.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let woken = gate.timed_wait(Duration::from_secs(30));
                (woken, start.elapsed())
            })
        };
        // keep waking until the sleeper has actually started waiting
        while !sleeper.is_finished() {
            gate.wake_one();
            thread::sleep(Duration::from_millis(1));
        }
        let (woken, elapsed) = sleeper.join().unwrap();
        assert!(woken);
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn wake_without_sleeper_is_dropped() {
        let gate = SleepGate::new();
        gate.wake_one();
        assert!(!gate.timed_wait(Duration::from_millis(5)));
    }
}
