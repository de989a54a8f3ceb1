use crate::icmp::v4::ProtocolErrorKind;
use crate::{PingError, PingResult, Ttl};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;

/// Unit in which latencies are reported.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Unit {
    #[default]
    Seconds,
    Milliseconds,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Seconds => "s",
            Unit::Milliseconds => "ms",
        }
    }

    pub fn convert(self, duration: Duration) -> f64 {
        match self {
            Unit::Seconds => duration.as_secs_f64(),
            Unit::Milliseconds => duration.as_secs_f64() * 1000.0,
        }
    }
}

impl FromStr for Unit {
    type Err = PingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(Unit::Seconds),
            "ms" => Ok(Unit::Milliseconds),
            other => Err(PingError::InvalidOption { message: format!("unit must be 's' or 'ms', got '{other}'") }),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Result of a single echo attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PingOutcome {
    Success { latency: Duration, unit: Unit },
    Timeout,
    ProtocolError { kind: ProtocolErrorKind },
    Unresolvable { host: String },
}

impl PingOutcome {
    /// Latency in the requested unit, `None` unless the attempt succeeded.
    pub fn latency(&self) -> Option<f64> {
        match self {
            PingOutcome::Success { latency, unit } => Some(unit.convert(*latency)),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PingOutcome::Success { .. })
    }

    /// Turns every non-success outcome into the matching error.
    pub(crate) fn into_result(self, timeout: Duration) -> PingResult<PingOutcome> {
        match self {
            PingOutcome::Success { .. } => Ok(self),
            PingOutcome::Timeout => Err(PingError::Timeout { timeout }),
            PingOutcome::ProtocolError { kind } => Err(PingError::Protocol(kind)),
            PingOutcome::Unresolvable { host } => Err(PingError::Unresolvable { host }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AttemptReport {
    /// Destination as given by the caller.
    pub destination: String,
    pub address: Ipv4Addr,
    pub sequence: u16,
    pub payload_size: usize,
    /// Observed TTL of the reply, or the configured TTL if there was none.
    pub ttl: Ttl,
    pub outcome: PingOutcome,
}

pub(crate) type ReportLineSender = mpsc::UnboundedSender<String>;
pub(crate) type ReportLineReceiver = mpsc::UnboundedReceiver<String>;

pub(crate) fn report_line_channel() -> (ReportLineSender, ReportLineReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::v4::UnreachableCode;

    #[test]
    fn unit_from_str() {
        assert_eq!(Unit::Seconds, "s".parse().unwrap());
        assert_eq!(Unit::Milliseconds, "ms".parse().unwrap());
        assert!(matches!("us".parse::<Unit>(), Err(PingError::InvalidOption { .. })));
    }

    #[test]
    fn latency_in_requested_unit() {
        let latency = Duration::from_micros(12_500);
        let seconds = PingOutcome::Success { latency, unit: Unit::Seconds };
        let millis = PingOutcome::Success { latency, unit: Unit::Milliseconds };
        assert_eq!(Some(0.0125), seconds.latency());
        assert_eq!(Some(12.5), millis.latency());
        assert_eq!(None, PingOutcome::Timeout.latency());
    }

    #[test]
    fn into_result_raises_non_success() {
        let timeout = Duration::from_millis(100);
        let success = PingOutcome::Success { latency: Duration::from_millis(1), unit: Unit::Seconds };
        assert_eq!(success.clone(), success.into_result(timeout).unwrap());
        assert!(matches!(PingOutcome::Timeout.into_result(timeout), Err(PingError::Timeout { timeout: t }) if t == timeout));
        let kind = ProtocolErrorKind::DestinationUnreachable { code: UnreachableCode::Port };
        assert!(matches!(
            PingOutcome::ProtocolError { kind }.into_result(timeout),
            Err(PingError::Protocol(k)) if k == kind
        ));
    }
}
