//! Multiple-readers-XOR-one-writer lock (component G).

use parking_lot::{
    RwLock as Inner, RwLockReadGuard as ReadGuard, RwLockWriteGuard as WriteGuard,
};

/// Uses `parking_lot`'s default fairness policy (a writer that starts
/// waiting is not starved by a stream of new readers).
pub struct RwLock<T>(Inner<T>);

impl<T> RwLock<T> {
    pub fn new(value: T) -> Self {
        RwLock(Inner::new(value))
    }

    pub fn reader_lock(&self) -> ReadGuard<'_, T> {
        self.0.read()
    }

    pub fn reader_try_lock(&self) -> Option<ReadGuard<'_, T>> {
        self.0.try_read()
    }

    pub fn writer_lock(&self) -> WriteGuard<'_, T> {
        self.0.write()
    }

    pub fn writer_try_lock(&self) -> Option<WriteGuard<'_, T>> {
        self.0.try_write()
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
    fn multiple_readers_allowed_concurrently() {
        let rw = RwLock::new(5);
        let r1 = rw.reader_lock();
        let r2 = rw.reader_lock();
        assert_eq!(*r1, 5);
        assert_eq!(*r2, 5);
        assert!(rw.writer_try_lock().is_none());
    }

    #[test]
    fn writer_excludes_readers() {
        let rw = Arc::new(RwLock::new(0));
        {
            let mut w = rw.writer_lock();
            *w = 1;
            assert!(rw.reader_try_lock().is_none());
        }
        assert_eq!(*rw.reader_lock(), 1);
    }
}
