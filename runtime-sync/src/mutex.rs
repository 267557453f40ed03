//! Non-recursive mutual exclusion lock (component G).

use parking_lot::{Mutex as Inner, MutexGuard as InnerGuard};

/// `lock` blocks until acquired; `try_lock` returns immediately. Unlocking
/// happens when the returned guard drops — Rust's borrow checker makes
/// "unlock by a non-owner" structurally impossible, the one case the
/// original API had to document as undefined behavior.
pub struct Mutex<T>(Inner<T>);

impl<T> Mutex<T> {
    pub fn new(value: T) -> Self {
        Mutex(Inner::new(value))
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
        let m = Arc::new(Mutex::new(0i64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&m);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        *m.lock() += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*m.lock(), 8000);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let m = Mutex::new(());
        let guard = m.lock();
        assert!(m.try_lock().is_none());
        drop(guard);
        assert!(m.try_lock().is_some());
    }
}
