//! One-line textual reports, as printed by verbose pinging.

use crate::{AttemptReport, PingError, PingOptions, PingOutcome};

fn prefix(destination: &str, options: &PingOptions) -> String {
    match &options.src_addr {
        Some(src_addr) => format!("ping '{destination}' from '{src_addr}'"),
        None => format!("ping '{destination}'"),
    }
}

pub fn format_attempt(report: &AttemptReport, options: &PingOptions) -> String {
    let head = format!(
        "{} seq={} size={} ttl={} ... ",
        prefix(&report.destination, options),
        report.sequence,
        report.payload_size,
        report.ttl
    );
    let tail = match &report.outcome {
        PingOutcome::Success { latency, .. } => {
            let unit = options.report_unit();
            format!("{}{}", unit.convert(*latency).round(), unit.suffix())
        }
        PingOutcome::Timeout => format!("Timeout > {}s", options.timeout.as_secs_f64()),
        PingOutcome::ProtocolError { kind } => format!("Error ({kind})"),
        PingOutcome::Unresolvable { host } => format!("Error (cannot resolve host '{host}')"),
    };
    head + &tail
}

/// Line for an error that ended a destination's sequence.
pub fn format_error(destination: &str, error: &PingError, options: &PingOptions) -> String {
    format!("{} ... Error ({error})", prefix(destination, options))
}
