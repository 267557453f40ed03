//! Uniform error taxonomy shared by every `multios-runtime` crate.
//!
//! Mirrors the C library's `{domain, code, native_code, message}` error
//! record, but replaces the caller-supplied out-parameter with an ordinary
//! `Result<T, Error>` — Rust has sum types, so there is no reason to thread
//! an `Option<&mut Error>` through every call.

use std::fmt;

/// Which subsystem a [`Code`] should be interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// No error occurred; `Code` is meaningless in this state.
    None,
    /// Plain blocking/non-blocking I/O (files, sockets before they connect).
    Io,
    /// Inter-process primitives: named semaphores, shared memory, sockets
    /// once connected.
    Ipc,
}

/// Alias kept for call sites that only ever see I/O-domain codes.
pub type IoCode = Code;
/// Alias kept for call sites that only ever see IPC-domain codes.
pub type IpcCode = Code;

/// A single code space shared by [`Domain::Io`] and [`Domain::Ipc`]; the
/// domain determines which subset is reachable from a given subsystem. The
/// `Ipc` domain additionally uses the connection-oriented variants at the
/// bottom of the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    InvalidArgument,
    NoResources,
    NotAvailable,
    AccessDenied,
    Aborted,
    NotSupported,
    TimedOut,
    WouldBlock,
    Failed,
    AddressInUse,
    // Connection-oriented, `Domain::Ipc` only.
    Connected,
    Connecting,
    ConnectionRefused,
    NotConnected,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::InvalidArgument => "invalid argument",
            Code::NoResources => "no resources",
            Code::NotAvailable => "not available",
            Code::AccessDenied => "access denied",
            Code::Aborted => "aborted",
            Code::NotSupported => "not supported",
            Code::TimedOut => "timed out",
            Code::WouldBlock => "would block",
            Code::Failed => "failed",
            Code::AddressInUse => "address in use",
            Code::Connected => "already connected",
            Code::Connecting => "connection in progress",
            Code::ConnectionRefused => "connection refused",
            Code::NotConnected => "not connected",
        };
        f.write_str(s)
    }
}

/// The error record threaded through every fallible `multios-runtime`
/// operation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{domain:?}/{code}: {message}")]
pub struct Error {
    pub domain: Domain,
    pub code: Code,
    /// Raw OS error number, when the failure originated from a syscall.
    pub native_code: Option<i32>,
    pub message: String,
}

impl Error {
    pub fn new(domain: Domain, code: Code, message: impl Into<String>) -> Self {
        Self { domain, code, native_code: None, message: message.into() }
    }

    pub fn with_native(domain: Domain, code: Code, native_code: i32, message: impl Into<String>) -> Self {
        Self { domain, code, native_code: Some(native_code), message: message.into() }
    }

    /// Library-level misuse: null handle, double free, op on a closed
    /// object. Always `io/invalid-argument` per the shared error policy.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Domain::Io, Code::InvalidArgument, message)
    }

    /// Translate a `std::io::Error` into the shared taxonomy, retaining the
    /// raw OS error number when one is present.
    pub fn from_io(domain: Domain, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::WouldBlock => Code::WouldBlock,
            std::io::ErrorKind::TimedOut => Code::TimedOut,
            std::io::ErrorKind::PermissionDenied => Code::AccessDenied,
            std::io::ErrorKind::AddrInUse => Code::AddressInUse,
            std::io::ErrorKind::NotConnected => Code::NotConnected,
            std::io::ErrorKind::ConnectionRefused => Code::ConnectionRefused,
            std::io::ErrorKind::InvalidInput | std::io::ErrorKind::InvalidData => Code::InvalidArgument,
            std::io::ErrorKind::Unsupported => Code::NotSupported,
            std::io::ErrorKind::Interrupted => Code::Failed,
            _ => Code::Failed,
        };
        let native_code = err.raw_os_error();
        let message = err.to_string();
        match native_code {
            Some(n) => Self::with_native(domain, code, n, message),
            None => Self::new(domain, code, message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_is_io_domain() {
        let e = Error::invalid_argument("null handle");
        assert_eq!(e.domain, Domain::Io);
        assert_eq!(e.code, Code::InvalidArgument);
        assert!(e.native_code.is_none());
    }

    #[test]
    fn from_io_preserves_native_code() {
        let io_err = std::io::Error::from_raw_os_error(110); // ETIMEDOUT on Linux
        let e = Error::from_io(Domain::Ipc, io_err);
        assert_eq!(e.code, Code::TimedOut);
        assert_eq!(e.native_code, Some(110));
    }

    #[test]
    fn display_is_human_readable() {
        let e = Error::new(Domain::Ipc, Code::NotConnected, "socket has no peer");
        let rendered = e.to_string();
        assert!(rendered.contains("not connected"));
        assert!(rendered.contains("socket has no peer"));
    }
}
