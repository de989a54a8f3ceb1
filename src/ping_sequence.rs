use crate::icmp::v4::{InterfaceBinding, RawSocket, SequenceNumber, TSocket};
use crate::pending_requests::PendingRequests;
use crate::ping_attempt::PingAttempt;
use crate::session::Session;
use crate::{AttemptReport, PingOptions, PingResult};
use futures::Stream;
use rand::Rng;
use std::net::Ipv4Addr;

pub(crate) struct SequenceLoop<S> {
    session: Session<S>,
    destination: String,
    identifier: u16,
    next_sequence: SequenceNumber,
    remaining: u16,
    started: bool,
    options: PingOptions,
    pending: PendingRequests,
}

impl<S> SequenceLoop<S>
where
    S: TSocket,
{
    pub(crate) fn new(session: Session<S>, destination: &str, options: &PingOptions) -> Self {
        let identifier = rand::thread_rng().gen::<u16>();
        tracing::debug!(destination, identifier, count = options.count, "starting ping sequence");
        Self {
            session,
            destination: destination.to_owned(),
            identifier,
            next_sequence: SequenceNumber::from(options.sequence_base),
            remaining: options.count,
            started: false,
            options: options.clone(),
            pending: PendingRequests::new(),
        }
    }

    pub(crate) fn remaining(&self) -> u16 {
        self.remaining
    }

    pub(crate) fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Runs the next attempt, pausing for the interval first unless it is the first one.
    pub(crate) async fn next_report(&mut self) -> Option<PingResult<AttemptReport>> {
        if self.remaining == 0 {
            return None;
        }
        if self.started && !self.options.interval.is_zero() {
            tokio::time::sleep(self.options.interval).await;
        }
        self.started = true;
        self.remaining -= 1;

        let sequence = self.next_sequence;
        self.next_sequence = sequence.next();
        Some(self.attempt(sequence).await)
    }

    async fn attempt(&mut self, sequence: SequenceNumber) -> PingResult<AttemptReport> {
        let mut attempt = PingAttempt::new(self.identifier, sequence, self.session.config().packet_size)?;
        let attempted = attempt.run(&self.session, &mut self.pending, self.options.latency_unit()).await?;
        let outcome = if self.options.raise_on_error {
            attempted.outcome.into_result(self.options.timeout)?
        } else {
            attempted.outcome
        };
        Ok(AttemptReport {
            destination: self.destination.clone(),
            address: self.session.destination(),
            sequence: sequence.into(),
            payload_size: self.session.config().packet_size,
            ttl: attempted.reply_ttl.unwrap_or(self.session.config().ttl),
            outcome,
        })
    }

    pub(crate) fn into_stream(self) -> impl Stream<Item = PingResult<AttemptReport>> {
        futures::stream::unfold(self, |mut sequence| async move {
            let report = sequence.next_report().await?;
            Some((report, sequence))
        })
    }
}

pub(crate) async fn open_raw(destination: &str, options: &PingOptions) -> PingResult<SequenceLoop<RawSocket>> {
    let session = Session::open(options.session_config(destination)?).await?;
    Ok(SequenceLoop::new(session, destination, options))
}

/// Lazy series of echo attempts against one destination.
///
/// The destination is resolved and the socket is opened by [`PingSequence::open`]; every
/// problem that would make all attempts fail is reported there. The sequence cannot be
/// restarted once exhausted.
pub struct PingSequence(SequenceLoop<RawSocket>);

impl PingSequence {
    pub async fn open(destination: &str, options: &PingOptions) -> PingResult<Self> {
        open_raw(destination, options).await.map(PingSequence)
    }

    /// `None` after `count` attempts.
    pub async fn next_report(&mut self) -> Option<PingResult<AttemptReport>> {
        self.0.next_report().await
    }

    pub fn remaining(&self) -> u16 {
        self.0.remaining()
    }

    pub fn address(&self) -> Ipv4Addr {
        self.0.session().destination()
    }

    pub fn interface_binding(&self) -> &InterfaceBinding {
        self.0.session().interface_binding()
    }

    pub fn into_stream(self) -> impl Stream<Item = PingResult<AttemptReport>> {
        self.0.into_stream()
    }
}
