//! Busy-waiting lock for very short critical sections (component G). Same
//! public shape as [`crate::mutex::Mutex`], backed by `spin` instead of
//! `parking_lot` so an uncontended acquire never parks the OS thread.

use spin::{Mutex as Inner, MutexGuard as InnerGuard};

pub struct Spinlock<T>(Inner<T>);

impl<T> Spinlock<T> {
    pub fn new(value: T) -> Self {
        Spinlock(Inner::new(value))
    }

    pub fn lock(&self) -> InnerGuard<'_, T> {
        self.0.lock()
    }

    pub fn try_lock(&self) -> Option<InnerGuard<'_, T>> {
        self.0.try_lock()
    }

    pub fn into_inner(self) -> T {
        self.0.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lock_excludes_concurrent_access() {
        let s = Arc::new(Spinlock::new(0i64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        *s.lock() += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*s.lock(), 4000);
    }
}
