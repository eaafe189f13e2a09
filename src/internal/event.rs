use parking_lot::{Condvar, Mutex};

/// Auto-reset event. [`ParkEvent::wait`] blocks until [`ParkEvent::set`] is
/// called and consumes the signal; a `set` with nobody waiting is remembered
/// for the next `wait`.
pub struct ParkEvent {
    mutex: Mutex<bool>,
    cv_signaled: Condvar,
}

impl ParkEvent {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(false),
            cv_signaled: Condvar::new(),
        }
    }

    pub fn wait(&self) {
        let mut signaled = self.mutex.lock();
        while !*signaled {
            self.cv_signaled.wait(&mut signaled);
        }
        *signaled = false;
    }

    pub fn set(&self) {
        let mut signaled = self.mutex.lock();
        *signaled = true;
        self.cv_signaled.notify_one();
    }
}

impl Default for ParkEvent {
    fn default() -> Self {
        Self::new()
    }
}
