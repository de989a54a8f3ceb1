use crate::icmp::v4::{decode_reply, EchoRequest, SequenceNumber, TSocket};
use crate::pending_requests::PendingRequests;
use crate::session::Session;
use crate::{PingOutcome, PingResult, Ttl, Unit};
use tokio::time::Instant;

// Large enough for an IPv4 header with options and a quoted request.
const MIN_RECV_BUFFER_SIZE: usize = 1500;
const MAX_IPV4_HEADER_SIZE: usize = 60;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum State {
    Idle,
    Sent,
    Correlated,
    TimedOut,
    TransportError,
}

pub(crate) struct Attempted {
    pub outcome: PingOutcome,
    /// TTL of the correlated reply, if any arrived.
    pub reply_ttl: Option<Ttl>,
}

/// One echo request and the wait for its correlated reply.
pub(crate) struct PingAttempt {
    states: Vec<State>,
    request: EchoRequest,
}

impl PingAttempt {
    pub(crate) fn new(identifier: u16, sequence: SequenceNumber, payload_size: usize) -> PingResult<Self> {
        Ok(PingAttempt { states: vec![State::Idle], request: EchoRequest::new(identifier, sequence, payload_size)? })
    }

    pub(crate) fn get_states(&self) -> Vec<State> {
        self.states.clone()
    }

    pub(crate) async fn run<S>(
        &mut self,
        session: &Session<S>,
        pending: &mut PendingRequests,
        unit: Unit,
    ) -> PingResult<Attempted>
    where
        S: TSocket,
    {
        let package = self.request.encode()?;
        pending.clear();

        let send_time = Instant::now();
        pending.insert(self.request.identifier(), self.request.sequence(), send_time);
        session.send(&package).await?;
        self.states.push(State::Sent);
        tracing::trace!(destination = %session.destination(), sequence = %self.request.sequence(), "icmpv4 sent");

        let deadline = send_time + session.config().timeout;
        let mut buf = vec![0u8; MIN_RECV_BUFFER_SIZE.max(MAX_IPV4_HEADER_SIZE + package.len())];
        loop {
            let Some((n, from)) = session.receive_until(deadline, &mut buf).await? else {
                self.states.push(State::TimedOut);
                tracing::trace!(sequence = %self.request.sequence(), "icmpv4 timeout");
                return Ok(Attempted { outcome: PingOutcome::Timeout, reply_ttl: None });
            };
            let receive_time = Instant::now();

            let reply = match decode_reply(&buf[..n]) {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::trace!(%from, "discarding datagram: {}", e);
                    continue;
                }
            };
            let Some(send_time) = pending.take(reply.identifier, reply.sequence) else {
                tracing::trace!(%from, identifier = reply.identifier, sequence = %reply.sequence, "discarding uncorrelated reply");
                continue;
            };

            return Ok(match reply.protocol_error() {
                None => {
                    self.states.push(State::Correlated);
                    let latency = receive_time - send_time;
                    tracing::trace!(source = %reply.source, ?latency, "icmpv4 received");
                    Attempted { outcome: PingOutcome::Success { latency, unit }, reply_ttl: Some(reply.ttl) }
                }
                Some(kind) => {
                    self.states.push(State::TransportError);
                    tracing::trace!(source = %reply.source, %kind, "icmpv4 error received");
                    Attempted { outcome: PingOutcome::ProtocolError { kind }, reply_ttl: None }
                }
            });
        }
    }
}
