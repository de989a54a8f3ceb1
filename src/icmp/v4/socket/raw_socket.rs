use super::{InterfaceBinding, TSocket};
use crate::ping_config::SessionConfig;
use crate::{PingError, PingResult};
use socket2::{Domain, Protocol, SockAddr, Type};
use std::io;
use std::mem::MaybeUninit;
use std::net::{IpAddr, SocketAddr, SocketAddrV4};
use tokio::io::unix::AsyncFd;

/// Privileged raw ICMPv4 socket registered with the tokio reactor.
pub(crate) struct RawSocket {
    inner: AsyncFd<socket2::Socket>,
}

impl RawSocket {
    pub(crate) fn open(config: &SessionConfig) -> PingResult<(Self, InterfaceBinding)> {
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                PingError::Privilege(e)
            } else {
                PingError::Io(e)
            }
        })?;
        socket.set_nonblocking(true)?;
        socket.set_ttl(u32::from(u8::from(config.ttl)))?;

        if let Some(src_addr) = config.src_addr {
            socket.bind(&SockAddr::from(SocketAddrV4::new(src_addr, 0)))?;
        }
        let interface_binding = match config.interface.as_deref() {
            None => InterfaceBinding::NotRequested,
            Some(interface) => bind_interface(&socket, interface)?,
        };

        tracing::trace!(ttl = %config.ttl, "raw socket created");
        Ok((RawSocket { inner: AsyncFd::new(socket)? }, interface_binding))
    }
}

#[cfg(any(target_os = "android", target_os = "fuchsia", target_os = "linux"))]
fn bind_interface(socket: &socket2::Socket, interface: &str) -> io::Result<InterfaceBinding> {
    socket.bind_device(Some(interface.as_bytes()))?;
    Ok(InterfaceBinding::Bound(interface.to_owned()))
}

#[cfg(not(any(target_os = "android", target_os = "fuchsia", target_os = "linux")))]
fn bind_interface(_socket: &socket2::Socket, interface: &str) -> io::Result<InterfaceBinding> {
    tracing::warn!(interface, "binding to an interface is not supported on this platform, using routing table");
    Ok(InterfaceBinding::Unsupported)
}

impl TSocket for RawSocket {
    async fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> io::Result<usize> {
        let addr = SockAddr::from(*addr);
        loop {
            let mut guard = self.inner.writable().await?;
            match guard.try_io(|inner| inner.get_ref().send_to(buf, &addr)) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        loop {
            let mut guard = self.inner.readable().await?;

            // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
            // to `&mut [MaybeUninit<u8>]`: recv never writes uninitialized bytes into the buffer.
            // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
            //
            // On a RAW socket we get the whole IP packet.
            let received = guard.try_io(|inner| {
                inner
                    .get_ref()
                    .recv_from(unsafe { &mut *(std::ptr::addr_of_mut!(*buf) as *mut [MaybeUninit<u8>]) })
            });
            match received {
                Ok(Ok((n, addr))) => {
                    let ip = addr
                        .as_socket()
                        .map(|socket_addr| socket_addr.ip())
                        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "peer is not an IP address"))?;
                    return Ok((n, ip));
                }
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
    }
}
