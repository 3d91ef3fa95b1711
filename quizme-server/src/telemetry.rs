//! Logging setup for the embed server

use crate::config::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,quizme=debug,tower_http=info";

/// Build the env filter from `RUST_LOG` or the default
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let registry = Registry::default().with(env_filter());

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()?,
    }

    Ok(())
}

/// Span for one embed data request
pub fn embed_request_span(quiz_id: &str, origin: &str) -> tracing::Span {
    tracing::info_span!("embed_request", quiz_id = %quiz_id, origin = %origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::with_default;

    #[test]
    fn test_embed_request_span_name() {
        with_default(Registry::default(), || {
            let span = embed_request_span("q1", "https://a.com");
            assert_eq!(span.metadata().unwrap().name(), "embed_request");
            let _guard = span.enter();
        });
    }

    #[test]
    fn test_default_filter_parses() {
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }
}
