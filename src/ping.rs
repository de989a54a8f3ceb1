use crate::icmp::v4::TSocket;
use crate::ping_sequence::{open_raw, SequenceLoop};
use crate::{PingError, PingOptions, PingOutcome, PingResult, PingRunner};
use std::io::Write;

/// Sends a single echo request to `destination` and waits for its reply.
///
/// `options.count` and `options.interval` are ignored. Unless `options.raise_on_error` is set,
/// timeouts, ICMP errors and unresolvable hosts come back as `Ok` outcomes; socket and option
/// errors are always returned as `Err`.
pub async fn ping(destination: &str, options: &PingOptions) -> PingResult<PingOutcome> {
    let options = PingOptions { count: 1, ..options.clone() };
    single_outcome(open_raw(destination, &options).await, options.raise_on_error).await
}

async fn single_outcome<S>(opened: PingResult<SequenceLoop<S>>, raise_on_error: bool) -> PingResult<PingOutcome>
where
    S: TSocket,
{
    let mut sequence = match opened {
        Ok(sequence) => sequence,
        Err(PingError::Unresolvable { host }) if !raise_on_error => return Ok(PingOutcome::Unresolvable { host }),
        Err(e) => return Err(e),
    };
    match sequence.next_report().await {
        Some(report) => report.map(|report| report.outcome),
        None => Err(PingError::InvalidOption { message: "count must be at least 1".to_owned() }),
    }
}

/// Pings `destination` `options.count` times, writing one line per attempt to `out`.
///
/// Latencies are printed in milliseconds unless `options.unit` is set.
pub async fn verbose_ping<W: Write>(destination: &str, options: &PingOptions, out: &mut W) -> PingResult<()> {
    let runner = PingRunner::new(options.clone());
    let mut reports = runner.run_verbose(&[destination.to_owned()], out).await?;
    match reports.pop().and_then(|report| report.error) {
        None => Ok(()),
        Some(PingError::Unresolvable { .. }) if !options.raise_on_error => Ok(()),
        Some(e) => Err(e),
    }
}
