use crate::icmp::v4::ProtocolErrorKind;
use std::io;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum PingError {
    /// The destination is neither an IPv4 literal nor resolvable to an IPv4 address.
    #[error("cannot resolve host '{host}'")]
    Unresolvable { host: String },

    #[error("request timed out after {}s", timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    /// A correlated ICMP error message was received instead of an echo reply.
    #[error("{0}")]
    Protocol(ProtocolErrorKind),

    #[error("payload size {size} exceeds the maximum of {max} bytes")]
    InvalidSize { size: usize, max: usize },

    /// Creating the raw socket was denied. Root or CAP_NET_RAW is required.
    #[error("permission denied creating raw ICMP socket (root or CAP_NET_RAW required): {0}")]
    Privilege(#[source] io::Error),

    #[error("invalid source address '{addr}'")]
    InvalidSourceAddress { addr: String },

    #[error("invalid option: {message}")]
    InvalidOption { message: String },

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

impl PingError {
    /// Fatal errors abort a destination's whole sequence before any attempt is made.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PingError::Unresolvable { .. }
                | PingError::InvalidSize { .. }
                | PingError::Privilege(_)
                | PingError::InvalidSourceAddress { .. }
                | PingError::InvalidOption { .. }
        )
    }
}
