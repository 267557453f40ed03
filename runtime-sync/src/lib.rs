//! Concurrency primitives, thread objects, and thread-local storage
//! (components G and H).
//!
//! Unlike the teacher's `no_std` scheduler, this crate runs on real OS
//! threads — there is no cooperative fallback, matching the spec's
//! "preemptive kernel-threaded runtime" scheduling model.

pub mod condvar;
pub mod mutex;
pub mod rwlock;
pub mod spinlock;
pub mod thread;
pub mod tls;

pub use condvar::Condvar;
pub use mutex::Mutex;
pub use rwlock::RwLock;
pub use spinlock::Spinlock;
pub use thread::{
    create, create_full, current, current_id, exit, ideal_count, sleep_ms, yield_now, Priority,
    Thread,
};
pub use tls::TlsKey;
