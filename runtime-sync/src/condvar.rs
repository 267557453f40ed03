//! Condition variable (component G). Must be paired with the same
//! [`crate::mutex::Mutex`] across every waiter on one condition.

use parking_lot::{Condvar as Inner, MutexGuard};

pub struct Condvar(Inner);

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

impl Condvar {
    pub fn new() -> Self {
        Condvar(Inner::new())
    }

    /// Atomically releases `guard`'s lock and blocks until [`Condvar::signal`]
    /// or [`Condvar::broadcast`]. Spurious wakeups are allowed; the caller is
    /// expected to re-check its predicate in a loop.
    pub fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.0.wait(guard);
    }

    pub fn signal(&self) {
        self.0.notify_one();
    }

    pub fn broadcast(&self) {
        self.0.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutex::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn signal_wakes_a_single_waiter() {
        let pair = Arc::new((Mutex::new(false), Condvar::new()));
        let pair2 = Arc::clone(&pair);

        let waiter = std::thread::spawn(move || {
            let (mutex, cv) = &*pair2;
            let mut ready = mutex.lock();
            while !*ready {
                cv.wait(&mut ready);
            }
        });

        std::thread::sleep(Duration::from_millis(20));
        let (mutex, cv) = &*pair;
        *mutex.lock() = true;
        cv.signal();

        waiter.join().unwrap();
    }
}
