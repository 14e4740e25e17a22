use tracing::Level;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::Layer;

use crate::core::context::configuration::VerbosityConfiguration;

/// Crates whose events follow the configured verbosity. Everything else, the RPC transports
/// included, only reports warnings.
const GASLESS_TARGETS: [&str; 8] = [
    "gasless_common",
    "gasless_evm",
    "gasless_sponsoring",
    "gasless_bundler",
    "gasless_relayer",
    "gasless_execution",
    "gasless_rpc",
    "gasless_service",
];

pub struct Fmt;

impl Fmt {
    pub fn layer<S>(verbosity: &VerbosityConfiguration) -> impl Layer<S>
    where
        S: for<'span> tracing_subscriber::registry::LookupSpan<'span> + tracing::Subscriber,
    {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .compact()
            .with_filter(Self::targets(verbosity))
    }

    fn targets(verbosity: &VerbosityConfiguration) -> Targets {
        let level = match verbosity {
            VerbosityConfiguration::Info => Level::INFO,
            VerbosityConfiguration::Debug => Level::DEBUG,
        };

        GASLESS_TARGETS
            .iter()
            .fold(Targets::new().with_default(LevelFilter::WARN), |targets, target| targets.with_target(*target, level))
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use crate::core::context::configuration::VerbosityConfiguration;
    use crate::core::tracing::Fmt;

    #[test]
    fn verbosity_applies_to_gasless_crates_only() {
        let targets = Fmt::targets(&VerbosityConfiguration::Debug);

        assert!(targets.would_enable("gasless_execution::execution", &Level::DEBUG));
        assert!(!targets.would_enable("gasless_execution::execution", &Level::TRACE));
        assert!(!targets.would_enable("alloy_transport_http", &Level::INFO));
        assert!(targets.would_enable("jsonrpsee_server", &Level::WARN));
    }

    #[test]
    fn info_verbosity_hides_debug_events() {
        let targets = Fmt::targets(&VerbosityConfiguration::Info);

        assert!(targets.would_enable("gasless_relayer", &Level::INFO));
        assert!(!targets.would_enable("gasless_relayer", &Level::DEBUG));
    }
}
