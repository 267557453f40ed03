//! Core types for the MultiOS runtime.
//!
//! This crate provides the leaf components every other `multios-runtime`
//! crate is built on: byte-order helpers and fixed-width integer constants,
//! the swappable memory vtable, the shared error taxonomy, atomic helpers,
//! and the layered `RuntimeConfig`. Everything here is a pure library with
//! no OS resources held directly — `runtime-sync`, `runtime-ipc`, and
//! `runtime-net` are the crates that acquire kernel objects.

pub mod atomic;
pub mod byteorder;
pub mod config;
pub mod error;
pub mod memory;
pub mod runtime;

pub use config::{LogVerbosity, RuntimeConfig};
pub use error::{Domain, Error, IoCode, IpcCode};
pub use runtime::Runtime;
