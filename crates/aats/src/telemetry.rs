use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(rust_log.as_deref(), &config.log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// An unparsable `RUST_LOG` falls back to the configured level.
fn build_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(log_level).map_err(|source| TelemetryError::EnvFilter {
        value: log_level.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_reported_with_value() {
        match build_filter(None, "aats=verbose") {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, "aats=verbose"),
            other => panic!("expected env filter error, got {other:?}"),
        }
    }

    #[test]
    fn rust_log_wins_over_configured_level() {
        let filter = build_filter(Some("aats=debug"), "aats=verbose").expect("rust_log parses");
        assert!(filter.to_string().contains("aats=debug"));
    }

    #[test]
    fn unparsable_rust_log_falls_back_to_configured_level() {
        let filter = build_filter(Some("aats=verbose"), "warn").expect("fallback parses");
        let rendered = filter.to_string();
        assert!(rendered.contains("warn"));
        assert!(!rendered.contains("verbose"));
    }
}
