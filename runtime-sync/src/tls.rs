//! Thread-local storage keys (component H), created at runtime rather
//! than as `thread_local!` statics — the idiomatic analogue of
//! `pthread_key_create`.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

type DestroyFn = Box<dyn Fn(Box<dyn Any>) + Send + Sync>;

static NEXT_KEY: AtomicUsize = AtomicUsize::new(0);

fn registry() -> &'static parking_lot::Mutex<HashMap<usize, DestroyFn>> {
    static REGISTRY: OnceLock<parking_lot::Mutex<HashMap<usize, DestroyFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| parking_lot::Mutex::new(HashMap::new()))
}

fn run_destructor(key: usize, value: Box<dyn Any>) {
    if let Some(f) = registry().lock().get(&key) {
        f(value);
    }
}

struct Storage(RefCell<HashMap<usize, Box<dyn Any>>>);

impl Drop for Storage {
    fn drop(&mut self) {
        // Every key this thread ever touched runs its destructor (if
        // one was configured) as the thread exits.
        for (key, value) in self.0.borrow_mut().drain() {
            run_destructor(key, value);
        }
    }
}

thread_local! {
    static STORAGE: Storage = Storage(RefCell::new(HashMap::new()));
}

/// A runtime-allocated TLS slot for values of type `T`. Distinct keys
/// never collide, even for the same `T`.
pub struct TlsKey<T: 'static> {
    id: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TlsKey<T> {
    /// A key with no destructor: values are simply dropped in place when
    /// overwritten by [`TlsKey::replace`] or when the owning thread exits.
    pub fn new() -> Self {
        Self::with_destructor(None::<fn(T)>)
    }

    /// A key whose value, when displaced by `replace` or by thread exit,
    /// is passed to `destroy` first.
    pub fn with_destructor<D>(destroy: Option<D>) -> Self
    where
        D: Fn(T) + Send + Sync + 'static,
    {
        let id = NEXT_KEY.fetch_add(1, Ordering::SeqCst);
        if let Some(destroy) = destroy {
            let boxed: DestroyFn = Box::new(move |value: Box<dyn Any>| {
                if let Ok(v) = value.downcast::<T>() {
                    destroy(*v);
                }
            });
            registry().lock().insert(id, boxed);
        }
        TlsKey { id, _marker: PhantomData }
    }

    /// Stores `value` for the calling thread without running any
    /// previously-stored value's destructor (it is simply dropped).
    pub fn set(&self, value: T) {
        STORAGE.with(|s| {
            s.0.borrow_mut().insert(self.id, Box::new(value));
        });
    }

    /// Stores `value`, running the previously-stored value's destructor
    /// (if one was configured) first.
    pub fn replace(&self, value: T) {
        let previous = STORAGE.with(|s| s.0.borrow_mut().insert(self.id, Box::new(value)));
        if let Some(prev) = previous {
            run_destructor(self.id, prev);
        }
    }

    /// Runs `f` with a reference to the calling thread's value, or with
    /// `None` if nothing has been stored on this thread yet.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        STORAGE.with(|s| {
            let map = s.0.borrow();
            let value = map.get(&self.id).and_then(|v| v.downcast_ref::<T>());
            f(value)
        })
    }

    pub fn get_cloned(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with(|v| v.cloned())
    }

    /// Releases the key itself. Values already stored on other threads
    /// are left untouched until those threads exit; because the
    /// destructor mapping is removed immediately, those values will be
    /// dropped silently rather than passed through `destroy`.
    pub fn free(self) {
        registry().lock().remove(&self.id);
    }
}

impl<T: 'static> Default for TlsKey<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize as AU, Ordering as O};
    use std::sync::Arc;

    #[test]
    fn set_and_get_round_trip_on_one_thread() {
        let key: TlsKey<String> = TlsKey::new();
        assert_eq!(key.with(|v| v.cloned()), None);
        key.set("hello".to_string());
        assert_eq!(key.get_cloned(), Some("hello".to_string()));
    }

    #[test]
    fn each_thread_has_its_own_slot() {
        let key: Arc<TlsKey<i32>> = Arc::new(TlsKey::new());
        key.set(1);
        let key2 = Arc::clone(&key);
        let other = std::thread::spawn(move || {
            assert_eq!(key2.get_cloned(), None);
            key2.set(2);
            key2.get_cloned()
        })
        .join()
        .unwrap();
        assert_eq!(other, Some(2));
        assert_eq!(key.get_cloned(), Some(1));
    }

    #[test]
    fn replace_runs_destructor_on_displaced_value() {
        static DESTROYED: AU = AU::new(0);
        let key = TlsKey::with_destructor(Some(|_: i32| {
            DESTROYED.fetch_add(1, O::SeqCst);
        }));
        key.set(1);
        assert_eq!(DESTROYED.load(O::SeqCst), 0);
        key.replace(2);
        assert_eq!(DESTROYED.load(O::SeqCst), 1);
        assert_eq!(key.get_cloned(), Some(2));
    }

    #[test]
    fn destructor_runs_on_thread_exit() {
        static DESTROYED: AU = AU::new(0);
        let key = Arc::new(TlsKey::with_destructor(Some(|_: i32| {
            DESTROYED.fetch_add(1, O::SeqCst);
        })));
        let key2 = Arc::clone(&key);
        std::thread::spawn(move || {
            key2.set(99);
        })
        .join()
        .unwrap();
        assert_eq!(DESTROYED.load(O::SeqCst), 1);
    }
}
