use anyhow::{anyhow, Result};
use basket_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Log lines go to stderr so command
/// payloads on stdout stay machine-readable.
///
/// `RUST_LOG` takes precedence over `logging.level` when it is set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(config)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn level_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let level = config.level.trim().to_ascii_lowercase();
    EnvFilter::try_new(&level)
        .map_err(|error| anyhow!("invalid logging.level `{}`: {error}", config.level))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(level: &str) -> LoggingConfig {
        LoggingConfig { level: level.to_string(), format: LogFormat::Compact }
    }

    #[test]
    fn configured_level_becomes_the_filter_directive() {
        let filter = level_filter(&logging(" WARN ")).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }
}
