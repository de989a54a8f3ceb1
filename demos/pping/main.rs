use asyncping::{init_logging, PingError, PingOptions, PingRunner};
use std::time::Duration;

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(argh::FromArgs)]
/// pping - send ICMP ECHO_REQUEST to several hosts concurrently
struct Args {
    #[argh(option, short = 'c', default = "4")]
    /// stop after <count> echo requests per host
    count: u16,

    #[argh(option, short = 't', default = "4.0")]
    /// time to wait for a reply, in seconds
    timeout: f64,

    #[argh(option, short = 'i', default = "0.0")]
    /// time to wait between two requests to the same host, in seconds
    interval: f64,

    #[argh(option, short = 'I')]
    /// network interface to send from
    interface: Option<String>,

    #[argh(option, short = 'S')]
    /// source IPv4 address
    src: Option<String>,

    #[argh(option, short = 'T', default = "64")]
    /// time to live of outgoing packets
    ttl: u8,

    #[argh(option, short = 's', default = "56")]
    /// number of payload bytes
    size: usize,

    #[argh(switch, short = 'D')]
    /// log debug messages to stderr
    debug: bool,

    #[argh(switch, short = 'E')]
    /// stop a host's pings at the first timeout or ICMP error
    exceptions: bool,

    #[argh(positional)]
    /// host names or IPv4 addresses
    destinations: Vec<String>,
}

fn seconds(value: f64, name: &str) -> Result<Duration, PingError> {
    Duration::try_from_secs_f64(value).map_err(|e| PingError::InvalidOption { message: format!("{name}: {e}") })
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();
    init_logging(args.debug)?;

    let options = PingOptions {
        count: args.count,
        timeout: seconds(args.timeout, "timeout")?,
        interval: seconds(args.interval, "interval")?,
        ttl: args.ttl,
        size: args.size,
        interface: args.interface,
        src_addr: args.src,
        raise_on_error: args.exceptions,
        ..PingOptions::default()
    };
    options.validate()?;

    let destinations = if args.destinations.is_empty() {
        vec!["example.com".to_owned(), "8.8.8.8".to_owned()]
    } else {
        args.destinations
    };

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let runner = PingRunner::new(options);
    let reports = runtime.block_on(runner.run_verbose(&destinations, &mut std::io::stdout()))?;

    // Without --exceptions the errors were already reported inline.
    if runner.options().raise_on_error {
        for report in reports {
            if let Some(e) = report.error {
                eprintln!("{}: {}", report.destination, e);
            }
        }
    }
    Ok(())
}
