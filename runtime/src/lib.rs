//! `multios-runtime`: a portable, cross-platform system runtime.
//!
//! This crate is a thin facade over its sibling crates — it adds no
//! logic of its own, only re-exporting each subsystem under a short
//! name so an application depends on one crate instead of seven:
//!
//! - [`core`] — error taxonomy, byte order, memory vtable, atomics,
//!   layered `RuntimeConfig`, and the process-global init/shutdown
//!   counter.
//! - [`hash`] — MD5, SHA-1, SHA-2, SHA-3/Keccak, and GOST R 34.11-94.
//! - [`tree`] — BST, red-black, and AVL self-balancing trees.
//! - [`sync`] — mutex, rwlock, spinlock, condvar, threads, and TLS.
//! - [`ipc`] — named semaphores, named shared memory, and a SHM cyclic
//!   buffer.
//! - [`net`] — stream/datagram/seqpacket sockets over IPv4/IPv6.
//! - [`util`] — INI parsing, filesystem helpers, dynamic loading,
//!   collections, profiling, string/process helpers, and variadic
//!   builders.

pub use multios_runtime_core as core;
pub use multios_runtime_hash as hash;
pub use multios_runtime_ipc as ipc;
pub use multios_runtime_net as net;
pub use multios_runtime_sync as sync;
pub use multios_runtime_tree as tree;
pub use multios_runtime_util as util;

pub use multios_runtime_core::config::RuntimeConfig;
pub use multios_runtime_core::error::{Code, Domain, Error};
pub use multios_runtime_core::runtime::Runtime;
