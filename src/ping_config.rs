use crate::icmp::v4::MAX_PAYLOAD_SIZE;
use crate::{PingError, PingResult, Ttl, Unit};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Options shared by every destination of a ping call.
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct PingOptions {
    /// Number of echo requests per destination.
    pub count: u16,
    /// Maximum wait for a correlated reply, per attempt.
    pub timeout: Duration,
    /// Pause between two attempts to the same destination.
    pub interval: Duration,
    pub ttl: u8,
    /// Echo payload size in bytes, ICMP header not included.
    pub size: usize,
    /// Network interface to send from (Linux only).
    pub interface: Option<String>,
    /// Local IPv4 address to send from.
    pub src_addr: Option<String>,
    /// Latency unit; `None` means seconds for [`crate::ping`] and milliseconds for verbose reports.
    pub unit: Option<Unit>,
    /// Report timeouts and ICMP errors as `Err` instead of outcomes.
    pub raise_on_error: bool,
    /// Sequence number of the first attempt.
    pub sequence_base: u16,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            count: 4,
            timeout: Duration::from_secs(4),
            interval: Duration::ZERO,
            ttl: Ttl::DEFAULT.0,
            size: 56,
            interface: None,
            src_addr: None,
            unit: None,
            raise_on_error: false,
            sequence_base: 0,
        }
    }
}

// Longest accepted timeout or interval, keeps deadline arithmetic on `Instant` in range.
const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

impl PingOptions {
    pub fn validate(&self) -> PingResult<()> {
        if self.count == 0 {
            return Err(PingError::InvalidOption { message: "count must be at least 1".to_owned() });
        }
        for (name, value) in [("timeout", self.timeout), ("interval", self.interval)] {
            if value > MAX_WAIT {
                return Err(PingError::InvalidOption {
                    message: format!("{name} must not exceed {}s, got {}s", MAX_WAIT.as_secs(), value.as_secs_f64()),
                });
            }
        }
        Ttl::for_sending(u32::from(self.ttl))?;
        if self.size > MAX_PAYLOAD_SIZE {
            return Err(PingError::InvalidSize { size: self.size, max: MAX_PAYLOAD_SIZE });
        }
        Ok(())
    }

    pub(crate) fn latency_unit(&self) -> Unit {
        self.unit.unwrap_or(Unit::Seconds)
    }

    pub(crate) fn report_unit(&self) -> Unit {
        self.unit.unwrap_or(Unit::Milliseconds)
    }

    /// Copy with the unit fixed to what verbose reporting prints.
    pub(crate) fn for_reporting(&self) -> PingOptions {
        PingOptions { unit: Some(self.report_unit()), ..self.clone() }
    }

    pub(crate) fn session_config(&self, destination: &str) -> PingResult<SessionConfig> {
        self.validate()?;
        let src_addr = self
            .src_addr
            .as_deref()
            .map(|addr| addr.parse::<Ipv4Addr>().map_err(|_| PingError::InvalidSourceAddress { addr: addr.to_owned() }))
            .transpose()?;
        Ok(SessionConfig {
            destination: destination.to_owned(),
            src_addr,
            interface: self.interface.clone(),
            ttl: Ttl(self.ttl),
            timeout: self.timeout,
            packet_size: self.size,
        })
    }
}

/// Per-destination socket parameters, fixed for the lifetime of one session.
#[derive(Clone, Debug)]
pub(crate) struct SessionConfig {
    pub destination: String,
    pub src_addr: Option<Ipv4Addr>,
    pub interface: Option<String>,
    pub ttl: Ttl,
    pub timeout: Duration,
    pub packet_size: usize,
}
