#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use icmp::v4::{encode_request, InterfaceBinding, ProtocolErrorKind, UnreachableCode, MAX_PAYLOAD_SIZE};
pub use logging::init_logging;
pub use ping::{ping, verbose_ping};
pub use ping_config::PingOptions;
pub use ping_error::PingError;
pub use ping_output::{AttemptReport, PingOutcome, Unit};
pub use ping_result::PingResult;
pub use ping_runner::{DestinationReport, PingRunner};
pub use ping_sequence::PingSequence;
pub use ttl::Ttl;

mod icmp;
mod logging;
mod pending_requests;
mod ping;
mod ping_attempt;
mod ping_config;
mod ping_error;
mod ping_output;
mod ping_result;
mod ping_runner;
mod ping_sequence;
pub mod report;
mod session;
mod ttl;
