use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = "pibx";

// HTTP client crates that log every connection at debug.
const HTTP_TARGETS: [&str; 3] = ["reqwest", "hyper_util", "h2"];

/// Per-target levels: `pibx` at debug when verbose and off otherwise. The
/// HTTP stack is capped at warn.
pub fn targets(verbose: bool) -> Targets {
    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    HTTP_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, Level::WARN)
        })
        .with_target(APP_TARGET, app_level)
}

/// Installs the global subscriber, writing to stderr so rendered output on
/// stdout stays clean. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "off" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(targets(verbose))
        .with(env_filter)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Logging was already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_app_debug() {
        let targets = targets(true);
        assert!(targets.would_enable("pibx::core::pipeline", &Level::DEBUG));
        assert!(!targets.would_enable("pibx", &Level::TRACE));
    }

    #[test]
    fn test_quiet_disables_app_logs() {
        let targets = targets(false);
        assert!(!targets.would_enable("pibx::providers::ibge", &Level::ERROR));
    }

    #[test]
    fn test_http_stack_is_capped_at_warn() {
        let targets = targets(true);
        assert!(!targets.would_enable("reqwest::connect", &Level::DEBUG));
        assert!(!targets.would_enable("hyper_util::client", &Level::INFO));
        assert!(targets.would_enable("reqwest", &Level::WARN));
    }

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        init_logging(false);
        init_logging(true);
    }
}
