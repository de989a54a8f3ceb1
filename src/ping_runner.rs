use crate::icmp::v4::TSocket;
use crate::ping_output::{report_line_channel, ReportLineSender};
use crate::ping_sequence::{open_raw, SequenceLoop};
use crate::report::{format_attempt, format_error};
use crate::{AttemptReport, PingError, PingOptions, PingResult};
use futures::future::join_all;
use std::future::Future;
use std::io::{self, Write};

/// Everything collected for one destination.
#[derive(Debug)]
pub struct DestinationReport {
    pub destination: String,
    pub attempts: Vec<AttemptReport>,
    /// The error that ended the sequence early, if any.
    pub error: Option<PingError>,
}

impl DestinationReport {
    fn new(destination: &str) -> Self {
        Self { destination: destination.to_owned(), attempts: vec![], error: None }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Pings several destinations concurrently on the current task, one sequence per destination.
pub struct PingRunner {
    options: PingOptions,
}

impl PingRunner {
    pub fn new(options: PingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PingOptions {
        &self.options
    }

    /// Reports come back in the order of `destinations`.
    pub async fn run(&self, destinations: &[String]) -> Vec<DestinationReport> {
        run_all(destinations, &self.options, |destination| open_raw(destination, &self.options)).await
    }

    /// Like [`PingRunner::run`], writing one line per attempt to `out` as attempts complete.
    ///
    /// Latencies are in milliseconds unless `options.unit` says otherwise.
    pub async fn run_verbose<W: Write>(&self, destinations: &[String], out: &mut W) -> io::Result<Vec<DestinationReport>> {
        let options = self.options.for_reporting();
        run_reporting(destinations, &options, out, |destination| open_raw(destination, &options)).await
    }
}

pub(crate) async fn run_all<'a, S, F, Fut>(
    destinations: &'a [String],
    options: &PingOptions,
    open: F,
) -> Vec<DestinationReport>
where
    S: TSocket,
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = PingResult<SequenceLoop<S>>>,
{
    join_all(destinations.iter().map(String::as_str).map(|destination| {
        let open = &open;
        async move { drive(destination, open(destination).await, options, None).await }
    }))
    .await
}

pub(crate) async fn run_reporting<'a, S, F, Fut, W>(
    destinations: &'a [String],
    options: &PingOptions,
    out: &mut W,
    open: F,
) -> io::Result<Vec<DestinationReport>>
where
    S: TSocket,
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = PingResult<SequenceLoop<S>>>,
    W: Write,
{
    let (line_tx, mut line_rx) = report_line_channel();
    let loops = async move {
        let reports = join_all(destinations.iter().map(String::as_str).map(|destination| {
            let open = &open;
            let line_tx = line_tx.clone();
            async move { drive(destination, open(destination).await, options, Some(&line_tx)).await }
        }))
        .await;
        drop(line_tx);
        reports
    };
    let writer = async {
        while let Some(line) = line_rx.recv().await {
            writeln!(out, "{line}")?;
            out.flush()?;
        }
        Ok::<(), io::Error>(())
    };

    let (reports, written) = tokio::join!(loops, writer);
    written?;
    Ok(reports)
}

async fn drive<S>(
    destination: &str,
    opened: PingResult<SequenceLoop<S>>,
    options: &PingOptions,
    lines: Option<&ReportLineSender>,
) -> DestinationReport
where
    S: TSocket,
{
    let mut report = DestinationReport::new(destination);
    let mut sequence = match opened {
        Ok(sequence) => sequence,
        Err(e) => {
            tracing::debug!(destination, "ping sequence not started: {}", e);
            report_error(lines, destination, &e, options);
            report.error = Some(e);
            return report;
        }
    };

    while let Some(result) = sequence.next_report().await {
        match result {
            Ok(attempt) => {
                if let Some(lines) = lines {
                    send_line(lines, format_attempt(&attempt, options));
                }
                report.attempts.push(attempt);
            }
            Err(e) => {
                tracing::debug!(destination, "ping sequence stopped: {}", e);
                report_error(lines, destination, &e, options);
                report.error = Some(e);
                break;
            }
        }
    }
    report
}

// In exceptions mode the error is handed to the caller instead of being printed.
fn report_error(lines: Option<&ReportLineSender>, destination: &str, error: &PingError, options: &PingOptions) {
    if let Some(lines) = lines {
        if !options.raise_on_error {
            send_line(lines, format_error(destination, error, options));
        }
    }
}

fn send_line(lines: &ReportLineSender, line: String) {
    if let Err(e) = lines.send(line) {
        tracing::error!("failed to send on report line channel: {}", e);
    }
}
