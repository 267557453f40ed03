//! Cross-platform socket abstraction (component L): stream, datagram, and
//! seqpacket sockets over IPv4/IPv6, grounded on the original's
//! `psocket.c`/`psocketaddress.c` but layered on `socket2` rather than raw
//! `libc` syscalls wherever the crate already covers the operation.

mod errors;
mod socket;
mod socket_address;

pub use socket::{ignore_sigpipe_once, IoCondition, Socket, SocketFamily, SocketProtocol, SocketType};
pub use socket_address::SocketAddress;
