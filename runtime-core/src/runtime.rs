//! Process-global init/shutdown pairing (design note: "global state ->
//! explicit init").
//!
//! The original C library tracks a one-shot init counter at file scope.
//! Here it is an explicit value: construct a [`Runtime`] with [`Runtime::init`],
//! drop it (or call [`Runtime::shutdown`]) to unwind. `init` is idempotent —
//! nested calls bump a reference count rather than re-running setup — and
//! every `shutdown` must pair with exactly one `init`.

use std::sync::atomic::{AtomicUsize, Ordering};

static INIT_COUNT: AtomicUsize = AtomicUsize::new(0);

/// A handle proving the runtime has been initialized at least once. Holding
/// one keeps the global init count above zero; dropping it (or calling
/// [`Runtime::shutdown`] explicitly) decrements it.
pub struct Runtime {
    shut_down: bool,
}

impl Runtime {
    /// Idempotent: calling this while other `Runtime` handles are alive
    /// just increments the shared counter and returns a new handle.
    pub fn init() -> Self {
        let previous = INIT_COUNT.fetch_add(1, Ordering::SeqCst);
        log::debug!("runtime init (count {} -> {})", previous, previous + 1);
        Runtime { shut_down: false }
    }

    /// Current global init count, exposed for the 1-to-1 pairing property
    /// test.
    pub fn active_count() -> usize {
        INIT_COUNT.load(Ordering::SeqCst)
    }

    /// Explicit shutdown; equivalent to dropping the handle, but lets
    /// callers observe the moment it happens.
    pub fn shutdown(mut self) {
        self.do_shutdown();
    }

    fn do_shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        let previous = INIT_COUNT.fetch_sub(1, Ordering::SeqCst);
        log::debug!("runtime shutdown (count {} -> {})", previous, previous.saturating_sub(1));
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.do_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_shutdown_pairs_by_count() {
        let before = Runtime::active_count();
        let a = Runtime::init();
        let b = Runtime::init();
        assert_eq!(Runtime::active_count(), before + 2);
        a.shutdown();
        assert_eq!(Runtime::active_count(), before + 1);
        drop(b);
        assert_eq!(Runtime::active_count(), before);
    }

    #[test]
    fn double_shutdown_is_a_no_op() {
        let before = Runtime::active_count();
        let r = Runtime::init();
        r.shutdown();
        // Calling do_shutdown twice (once explicitly, once via a would-be
        // Drop) must not under-flow the counter. We can't call shutdown
        // twice on the same owned value, so this test just pins the
        // single-shutdown behavior documented above.
        assert_eq!(Runtime::active_count(), before);
    }
}
