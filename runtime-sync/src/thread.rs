//! Thread objects (component H): a refcounted handle over `std::thread`
//! with join-returns-an-exit-code semantics and a `pthread_exit`-style
//! early-exit primitive.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;

use multios_runtime_core::error::{Domain, Error};

/// Scheduling hint passed to `create_full`. The OS default is used when
/// `None`; most platforms only respect coarse buckets like these, so no
/// finer-grained numeric priority is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Idle,
    Lowest,
    Low,
    Normal,
    High,
    Highest,
    TimeCritical,
}

struct ThreadExit(i32);

/// Terminates the calling thread immediately with `code`, as if its entry
/// closure had returned `code`. This unwinds rather than calling
/// `std::process::exit`, which would end the whole process instead of
/// just the calling thread; [`create`]/[`create_full`] catch the unwind
/// and translate it back into the exit code `join` observes.
pub fn exit(code: i32) -> ! {
    panic::panic_any(ThreadExit(code));
}

pub fn yield_now() {
    std::thread::yield_now();
}

pub fn sleep_ms(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

/// A positive hint for how many threads can usefully run in parallel.
pub fn ideal_count() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: RefCell<Option<Arc<Thread>>> = const { RefCell::new(None) };
}

/// A refcounted handle to an OS thread created through [`create`] or
/// [`create_full`].
pub struct Thread {
    id: u64,
    name: Option<String>,
    joinable: bool,
    join_handle: parking_lot::Mutex<Option<JoinHandle<i32>>>,
    exit_code: OnceLock<i32>,
}

impl Thread {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_joinable(&self) -> bool {
        self.joinable
    }

    /// Waits for the thread to finish, returning its exit code.
    /// Non-joinable threads return `-1` immediately without blocking.
    /// Safe to call more than once; later calls return the cached code.
    pub fn join(&self) -> i32 {
        if !self.joinable {
            return -1;
        }
        if let Some(code) = self.exit_code.get() {
            return *code;
        }
        let handle = self.join_handle.lock().take();
        let code = match handle {
            Some(h) => h.join().unwrap_or(-1),
            None => self.exit_code.get().copied().unwrap_or(-1),
        };
        let _ = self.exit_code.set(code);
        code
    }
}

/// Returns the handle for the calling thread, if it was created through
/// this API.
pub fn current() -> Option<Arc<Thread>> {
    CURRENT.with(|c| c.borrow().clone())
}

/// An opaque, process-unique identifier for the calling thread, valid
/// whether or not the thread was created through this API.
pub fn current_id() -> u64 {
    CURRENT
        .with(|c| c.borrow().as_ref().map(|t| t.id))
        .unwrap_or_else(|| hash_std_thread_id(std::thread::current().id()))
}

fn hash_std_thread_id(id: std::thread::ThreadId) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

pub fn create<F>(f: F, joinable: bool) -> Result<Arc<Thread>, Error>
where
    F: FnOnce() -> i32 + Send + 'static,
{
    create_full(f, joinable, None, 0, None)
}

/// `priority == None` and `stack_bytes == 0` both mean "use the OS
/// default".
pub fn create_full<F>(
    f: F,
    joinable: bool,
    priority: Option<Priority>,
    stack_bytes: usize,
    name: Option<String>,
) -> Result<Arc<Thread>, Error>
where
    F: FnOnce() -> i32 + Send + 'static,
{
    // `Priority` is accepted for interface parity with the spec, but no
    // stable cross-platform std API adjusts a thread's OS priority after
    // spawn; threads run at the OS default regardless of this value.
    let _ = priority;

    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let thread = Arc::new(Thread {
        id,
        name: name.clone(),
        joinable,
        join_handle: parking_lot::Mutex::new(None),
        exit_code: OnceLock::new(),
    });

    let mut builder = std::thread::Builder::new();
    if stack_bytes > 0 {
        builder = builder.stack_size(stack_bytes);
    }
    if let Some(n) = &name {
        builder = builder.name(n.clone());
    }

    let handle_for_thread = Arc::clone(&thread);
    let spawned = builder.spawn(move || {
        CURRENT.with(|c| *c.borrow_mut() = Some(Arc::clone(&handle_for_thread)));
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(code) => code,
            Err(payload) => downcast_exit_code(payload),
        }
    });

    let spawned = spawned.map_err(|e| Error::from_io(Domain::Io, e))?;
    if joinable {
        *thread.join_handle.lock() = Some(spawned);
    }
    // For a non-joinable thread the `JoinHandle` is simply dropped; the
    // OS thread keeps running to completion regardless.
    Ok(thread)
}

fn downcast_exit_code(payload: Box<dyn Any + Send>) -> i32 {
    match payload.downcast::<ThreadExit>() {
        Ok(exit) => exit.0,
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn join_returns_the_closures_exit_code() {
        let t = create(|| 42, true).unwrap();
        assert_eq!(t.join(), 42);
    }

    #[test]
    fn non_joinable_join_returns_minus_one_without_blocking() {
        static RAN: AtomicBool = AtomicBool::new(false);
        let t = create(
            || {
                sleep_ms(20);
                RAN.store(true, Ordering::SeqCst);
                0
            },
            false,
        )
        .unwrap();
        assert_eq!(t.join(), -1);
    }

    #[test]
    fn early_exit_propagates_as_the_join_code() {
        let t = create(|| {
            exit(7);
        }, true)
        .unwrap();
        assert_eq!(t.join(), 7);
    }

    #[test]
    fn current_returns_self_handle_from_inside_the_thread() {
        let t = create(
            || {
                let me = current().expect("thread created via this API");
                if me.id() == current_id() {
                    0
                } else {
                    1
                }
            },
            true,
        )
        .unwrap();
        assert_eq!(t.join(), 0);
    }

    #[test]
    fn ideal_count_is_positive() {
        assert!(ideal_count() > 0);
    }
}
