use std::io;
use std::net::{IpAddr, SocketAddr};

pub(crate) mod raw_socket;

/// Non-blocking datagram transport used by a ping session. Implementors suspend the calling
/// task, never the thread, while waiting for the socket.
pub(crate) trait TSocket {
    async fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> io::Result<usize>;
    /// Receives one datagram into `buf`. For raw sockets this includes the IPv4 header.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)>;
}

/// Outcome of the interface binding requested for a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InterfaceBinding {
    NotRequested,
    Bound(String),
    /// The platform has no per-socket interface binding; egress follows the routing table.
    Unsupported,
}
