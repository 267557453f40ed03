//! Inter-process primitives (components I, J, K): named semaphores, named
//! shared memory regions, and a SHM-backed cyclic byte buffer.
//!
//! Every named kernel object in this crate is addressed by a
//! [`naming::platform_key`] derived from the caller's user-visible name, so
//! two processes that pass the same `name` to [`semaphore::Semaphore::new`]
//! or [`shm::Shm::new`] always resolve to the same OS object.

mod naming;
pub mod semaphore;
pub mod shm;
pub mod shm_buffer;

pub use semaphore::{OpenMode, Semaphore};
pub use shm::{AccessPerms, Shm};
pub use shm_buffer::ShmBuffer;
