//! Platform hooks for transparent proxying
//!
//! Transparent mode needs to ask the OS where an intercepted connection was
//! originally headed. Only platforms with a [`DestinationResolver`] support it.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
pub trait DestinationResolver: Send + Sync {
    /// The address the client dialled before the redirect rule rewrote it.
    fn original_addr(&self, conn: &TcpStream) -> io::Result<SocketAddr>;
}

/// The resolver for the running platform, if transparent mode is supported.
pub fn resolver() -> Option<Arc<dyn DestinationResolver>> {
    #[cfg(target_os = "linux")]
    {
        Some(Arc::new(linux::NetfilterResolver))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::DestinationResolver;
    use nix::sys::socket::{getsockopt, sockopt::OriginalDst};
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};

    /// Reads `SO_ORIGINAL_DST` as set by an iptables `REDIRECT` rule.
    #[derive(Debug)]
    pub struct NetfilterResolver;

    impl DestinationResolver for NetfilterResolver {
        fn original_addr(&self, conn: &TcpStream) -> io::Result<SocketAddr> {
            let addr = getsockopt(conn, OriginalDst).map_err(io::Error::from)?;
            let ip = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
            let port = u16::from_be(addr.sin_port);
            Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_linux_has_resolver() {
        assert!(resolver().is_some());
    }

    #[test]
    #[cfg(not(target_os = "linux"))]
    fn test_other_platforms_have_no_resolver() {
        assert!(resolver().is_none());
    }
}
