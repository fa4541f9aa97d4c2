use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILTER_ENV: &str = "FLOATCHAT_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

static INIT_LOGGING: Once = Once::new();

/// Installs the global subscriber once. Events go to stderr so stdout stays
/// clean for JSON envelopes.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let stderr_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::io::stderr);

        // A host process may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init();
    });
}
