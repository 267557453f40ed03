//! Shared OS-errno-to-taxonomy translation table (component L's "error
//! translation"), grounded on the original's `__p_socket_get_error_from_errno`
//! split between its POSIX and Win32 tables.

use multios_runtime_core::error::{Code, Domain, Error};

#[cfg(unix)]
fn code_from_errno(errno: i32) -> Code {
    match errno {
        libc::EACCES | libc::EPERM => Code::AccessDenied,
        libc::EADDRINUSE => Code::AddressInUse,
        libc::EALREADY | libc::EINPROGRESS => Code::Connecting,
        libc::EISCONN => Code::Connected,
        libc::ECONNREFUSED => Code::ConnectionRefused,
        libc::ENOTCONN => Code::NotConnected,
        libc::EAGAIN => Code::WouldBlock,
        libc::EBADF | libc::ENOTSOCK | libc::EINVAL | libc::EFAULT => Code::InvalidArgument,
        libc::EPROTONOSUPPORT | libc::EAFNOSUPPORT | libc::EOPNOTSUPP | libc::EPFNOSUPPORT => Code::NotSupported,
        libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM => Code::NoResources,
        libc::ETIMEDOUT => Code::TimedOut,
        libc::ENETUNREACH | libc::EHOSTUNREACH | libc::ECONNRESET | libc::ECONNABORTED => Code::Aborted,
        _ => Code::Failed,
    }
}

#[cfg(windows)]
fn code_from_errno(errno: i32) -> Code {
    // WSA* constants, matching the original's `__p_socket_get_error_win`.
    const WSAEACCES: i32 = 10013;
    const WSAEADDRINUSE: i32 = 10048;
    const WSAEALREADY: i32 = 10037;
    const WSAEINPROGRESS: i32 = 10036;
    const WSAEISCONN: i32 = 10056;
    const WSAECONNREFUSED: i32 = 10061;
    const WSAENOTCONN: i32 = 10057;
    const WSAEWOULDBLOCK: i32 = 10035;
    const WSAEINVAL: i32 = 10022;
    const WSAENOTSOCK: i32 = 10038;
    const WSAEAFNOSUPPORT: i32 = 10047;
    const WSAEPROTONOSUPPORT: i32 = 10043;
    const WSAEOPNOTSUPP: i32 = 10045;
    const WSAEPFNOSUPPORT: i32 = 10046;
    const WSAETIMEDOUT: i32 = 10060;
    const WSAECONNRESET: i32 = 10054;
    const WSAECONNABORTED: i32 = 10053;
    const WSAENETUNREACH: i32 = 10051;
    const WSAEHOSTUNREACH: i32 = 10065;

    match errno {
        WSAEACCES => Code::AccessDenied,
        WSAEADDRINUSE => Code::AddressInUse,
        WSAEALREADY | WSAEINPROGRESS => Code::Connecting,
        WSAEISCONN => Code::Connected,
        WSAECONNREFUSED => Code::ConnectionRefused,
        WSAENOTCONN => Code::NotConnected,
        WSAEWOULDBLOCK => Code::WouldBlock,
        WSAEINVAL | WSAENOTSOCK => Code::InvalidArgument,
        WSAEAFNOSUPPORT | WSAEPROTONOSUPPORT | WSAEOPNOTSUPP | WSAEPFNOSUPPORT => Code::NotSupported,
        WSAETIMEDOUT => Code::TimedOut,
        WSAECONNRESET | WSAECONNABORTED | WSAENETUNREACH | WSAEHOSTUNREACH => Code::Aborted,
        _ => Code::Failed,
    }
}

/// Translates the calling thread's last OS error into the shared taxonomy.
pub fn translate_last_os_error() -> Error {
    translate_io_error(std::io::Error::last_os_error())
}

pub fn translate_io_error(err: std::io::Error) -> Error {
    match err.raw_os_error() {
        Some(errno) => Error::with_native(Domain::Ipc, code_from_errno(errno), errno, format!("socket: {err}")),
        None => Error::new(Domain::Ipc, Code::Failed, format!("socket: {err}")),
    }
}

/// `true` iff the error represents a transient, retry-worthy interruption
/// (`EINTR`); the library retries these internally rather than surfacing
/// them to the caller.
#[cfg(unix)]
pub fn is_eintr(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINTR)
}

#[cfg(windows)]
pub fn is_eintr(_err: &std::io::Error) -> bool {
    false
}

/// `true` iff the error means "would block" (`EAGAIN`/`EWOULDBLOCK`/
/// `WSAEWOULDBLOCK`) or "connection in progress" (`EINPROGRESS`) — the two
/// cases the logically-blocking path turns into a poll-then-retry.
pub fn is_would_block_or_in_progress(err: &std::io::Error) -> bool {
    matches!(err.kind(), std::io::ErrorKind::WouldBlock) || {
        #[cfg(unix)]
        {
            err.raw_os_error() == Some(libc::EINPROGRESS)
        }
        #[cfg(windows)]
        {
            false
        }
    }
}
