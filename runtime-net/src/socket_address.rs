//! Socket address: a tagged union of IPv4 and IPv6 endpoints, grounded on
//! the original's `psocketaddress.c` (constructible from a string, from
//! "any", from "loopback", or from a raw `sockaddr` blob) but built on
//! `socket2::SockAddr` rather than hand-rolled `sockaddr_storage` byte
//! twiddling.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr as StdSocketAddr};

use multios_runtime_core::error::{Domain, Error};
use socket2::SockAddr;

use crate::SocketFamily;

/// A socket endpoint: either an IPv4 `{address, port}` pair or an IPv6
/// `{address, port, flowinfo, scope_id}` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketAddress {
    V4 { addr: Ipv4Addr, port: u16 },
    V6 { addr: Ipv6Addr, port: u16, flowinfo: u32, scope_id: u32 },
}

impl SocketAddress {
    /// Parses a dotted-quad or colon-separated address string plus port.
    pub fn new(address: &str, port: u16) -> Result<Self, Error> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| Error::invalid_argument(format!("invalid socket address string: {address}")))?;
        Ok(match ip {
            IpAddr::V4(addr) => SocketAddress::V4 { addr, port },
            IpAddr::V6(addr) => SocketAddress::V6 { addr, port, flowinfo: 0, scope_id: 0 },
        })
    }

    /// The wildcard address (`0.0.0.0` / `::`) for the given family.
    pub fn new_any(family: SocketFamily, port: u16) -> Self {
        match family {
            SocketFamily::V6 => SocketAddress::V6 { addr: Ipv6Addr::UNSPECIFIED, port, flowinfo: 0, scope_id: 0 },
            _ => SocketAddress::V4 { addr: Ipv4Addr::UNSPECIFIED, port },
        }
    }

    /// The loopback address (`127.0.0.1` / `::1`) for the given family.
    pub fn new_loopback(family: SocketFamily, port: u16) -> Self {
        match family {
            SocketFamily::V6 => SocketAddress::V6 { addr: Ipv6Addr::LOCALHOST, port, flowinfo: 0, scope_id: 0 },
            _ => SocketAddress::V4 { addr: Ipv4Addr::LOCALHOST, port },
        }
    }

    /// Reconstructs an address from a raw, platform `sockaddr` blob (as
    /// returned by `getsockname`/`recvfrom`).
    pub fn new_from_native(native: &SockAddr) -> Result<Self, Error> {
        if let Some(v4) = native.as_socket_ipv4() {
            Ok(SocketAddress::V4 { addr: *v4.ip(), port: v4.port() })
        } else if let Some(v6) = native.as_socket_ipv6() {
            Ok(SocketAddress::V6 {
                addr: *v6.ip(),
                port: v6.port(),
                flowinfo: v6.flowinfo(),
                scope_id: v6.scope_id(),
            })
        } else {
            Err(Error::new(Domain::Io, multios_runtime_core::error::Code::NotSupported, "unsupported sockaddr family"))
        }
    }

    /// Renders this address into the platform's native `sockaddr`
    /// representation, ready to pass to `bind`/`connect`/`sendto`.
    pub fn to_native(self) -> SockAddr {
        SockAddr::from(StdSocketAddr::from(self))
    }

    pub fn family(self) -> SocketFamily {
        match self {
            SocketAddress::V4 { .. } => SocketFamily::V4,
            SocketAddress::V6 { .. } => SocketFamily::V6,
        }
    }

    pub fn address(self) -> IpAddr {
        match self {
            SocketAddress::V4 { addr, .. } => IpAddr::V4(addr),
            SocketAddress::V6 { addr, .. } => IpAddr::V6(addr),
        }
    }

    pub fn port(self) -> u16 {
        match self {
            SocketAddress::V4 { port, .. } => port,
            SocketAddress::V6 { port, .. } => port,
        }
    }

    pub fn is_any(self) -> bool {
        self.address().is_unspecified()
    }

    pub fn is_loopback(self) -> bool {
        self.address().is_loopback()
    }
}

impl From<SocketAddress> for StdSocketAddr {
    fn from(addr: SocketAddress) -> Self {
        match addr {
            SocketAddress::V4 { addr, port } => StdSocketAddr::new(IpAddr::V4(addr), port),
            SocketAddress::V6 { addr, port, flowinfo, scope_id } => {
                std::net::SocketAddrV6::new(addr, port, flowinfo, scope_id).into()
            }
        }
    }
}

impl From<StdSocketAddr> for SocketAddress {
    fn from(addr: StdSocketAddr) -> Self {
        match addr {
            StdSocketAddr::V4(v4) => SocketAddress::V4 { addr: *v4.ip(), port: v4.port() },
            StdSocketAddr::V6(v6) => {
                SocketAddress::V6 { addr: *v6.ip(), port: v6.port(), flowinfo: v6.flowinfo(), scope_id: v6.scope_id() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips_through_native() {
        let addr = SocketAddress::new("127.0.0.1", 5432).unwrap();
        let native = addr.to_native();
        let back = SocketAddress::new_from_native(&native).unwrap();
        assert_eq!(addr, back);
        assert_eq!(back.address().to_string(), "127.0.0.1");
        assert_eq!(back.port(), 5432);
    }

    #[test]
    fn ipv6_round_trips_through_native() {
        let addr = SocketAddress::new("::1", 9000).unwrap();
        let native = addr.to_native();
        let back = SocketAddress::new_from_native(&native).unwrap();
        assert_eq!(addr, back);
        assert_eq!(back.family(), SocketFamily::V6);
    }

    #[test]
    fn any_and_loopback_are_flagged_correctly() {
        let any = SocketAddress::new_any(SocketFamily::V4, 0);
        assert!(any.is_any());
        assert!(!any.is_loopback());

        let lo = SocketAddress::new_loopback(SocketFamily::V4, 0);
        assert!(lo.is_loopback());
        assert!(!lo.is_any());
    }

    #[test]
    fn invalid_string_is_rejected() {
        assert!(SocketAddress::new("not-an-address", 80).is_err());
    }
}
