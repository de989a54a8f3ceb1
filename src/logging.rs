use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs a global fmt subscriber writing to stderr. `RUST_LOG` overrides the level chosen
/// by `debug` (DEBUG when set, WARN otherwise).
pub fn init_logging(debug: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_global_subscriber() {
        let _ = init_logging(false);
        assert!(init_logging(true).is_err());
    }
}
