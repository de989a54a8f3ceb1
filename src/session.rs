use crate::icmp::v4::{InterfaceBinding, RawSocket, TSocket};
use crate::ping_config::SessionConfig;
use crate::{PingError, PingResult};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::time::Instant;

/// Resolves an IPv4 literal or host name to the first IPv4 address found.
pub(crate) async fn resolve(host: &str) -> PingResult<Ipv4Addr> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }
    let unresolvable = || PingError::Unresolvable { host: host.to_owned() };
    let addrs = tokio::net::lookup_host((host, 0)).await.map_err(|e| {
        tracing::debug!(host, "lookup failed: {}", e);
        unresolvable()
    })?;
    addrs
        .into_iter()
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(unresolvable)
}

/// One socket bound to one destination for the duration of a ping call.
pub(crate) struct Session<S> {
    socket: S,
    destination: Ipv4Addr,
    config: SessionConfig,
    interface_binding: InterfaceBinding,
}

impl Session<RawSocket> {
    pub(crate) async fn open(config: SessionConfig) -> PingResult<Self> {
        let destination = resolve(&config.destination).await?;
        let (socket, interface_binding) = RawSocket::open(&config)?;
        tracing::debug!(host = %config.destination, %destination, ?interface_binding, "session opened");
        Ok(Session { socket, destination, config, interface_binding })
    }
}

impl<S> Session<S>
where
    S: TSocket,
{
    #[cfg(test)]
    pub(crate) fn with_socket(socket: S, destination: Ipv4Addr, config: SessionConfig) -> Self {
        Session { socket, destination, config, interface_binding: InterfaceBinding::NotRequested }
    }

    pub(crate) fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn interface_binding(&self) -> &InterfaceBinding {
        &self.interface_binding
    }

    pub(crate) async fn send(&self, package: &[u8]) -> io::Result<()> {
        let addr = SocketAddr::new(IpAddr::V4(self.destination), 0);
        self.socket.send_to(package, &addr).await?;
        Ok(())
    }

    /// `Ok(None)` when nothing arrived before `deadline`.
    pub(crate) async fn receive_until(&self, deadline: Instant, buf: &mut [u8]) -> io::Result<Option<(usize, IpAddr)>> {
        match tokio::time::timeout_at(deadline, self.socket.recv_from(buf)).await {
            Ok(Ok(received)) => Ok(Some(received)),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(None),
        }
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        tracing::debug!(destination = %self.destination, "session closed");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::icmp::v4::tests::SocketMock;
    use crate::icmp::v4::encode_request;
    use crate::PingOptions;
    use more_asserts::{assert_ge, assert_lt};
    use std::time::Duration;

    pub(crate) fn session_with(socket: SocketMock, options: &PingOptions) -> Session<SocketMock> {
        let config = options.session_config("127.0.0.1").unwrap();
        Session::with_socket(socket, Ipv4Addr::LOCALHOST, config)
    }

    #[tokio::test]
    async fn resolve_ipv4_literal() {
        assert_eq!(Ipv4Addr::new(8, 8, 8, 8), resolve("8.8.8.8").await.unwrap());
    }

    #[tokio::test]
    async fn resolve_ipv6_literal_is_unresolvable() {
        let result = resolve("::1").await;
        assert!(matches!(result, Err(PingError::Unresolvable { host }) if host == "::1"));
    }

    #[tokio::test]
    async fn resolve_unknown_host_carries_name() {
        let result = resolve("not.exist.invalid").await;
        assert!(matches!(result, Err(PingError::Unresolvable { host }) if host == "not.exist.invalid"));
    }

    #[tokio::test(start_paused = true)]
    async fn receive_until_returns_none_at_deadline() {
        let socket = SocketMock::silent();
        let session = session_with(socket, &PingOptions::default());
        let mut buf = [0u8; 128];
        let start = Instant::now();

        let received = session.receive_until(start + Duration::from_millis(250), &mut buf).await.unwrap();

        assert!(received.is_none());
        assert_ge!(start.elapsed(), Duration::from_millis(250));
        assert_lt!(start.elapsed(), Duration::from_millis(260));
    }

    #[tokio::test(start_paused = true)]
    async fn send_then_receive_echo() {
        let socket = SocketMock::echoing(1, Duration::from_millis(10));
        let session = session_with(socket.clone(), &PingOptions::default());
        let package = encode_request(7, 1, 8).unwrap();
        let mut buf = [0u8; 128];

        session.send(&package).await.unwrap();
        let received = session.receive_until(Instant::now() + Duration::from_secs(1), &mut buf).await.unwrap();

        assert_eq!(Some((20 + 8 + 8, IpAddr::V4(Ipv4Addr::LOCALHOST))), received);
        socket
            .should_send_number_of_messages(1)
            .should_send_to_address(&IpAddr::V4(Ipv4Addr::LOCALHOST))
            .should_receive_number_of_messages(1);
    }
}
