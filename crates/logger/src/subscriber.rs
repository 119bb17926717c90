use std::env::var;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber from a configured level name.
///
/// An unknown name falls back to INFO and is reported once the subscriber
/// is installed. `RUST_LOG` still wins when set, and `RUST_LOG_FORMAT=json`
/// switches to line-delimited JSON output. Calling this twice is harmless,
/// the second call leaves the first subscriber in place.
pub fn init_tracing_from_config(level_name: &str) {
    let level = parse_level(level_name);
    init_tracing_with_level(*level.as_ref().unwrap_or(&LevelFilter::INFO));

    if let Err(error) = level {
        warn!("Unknown log level {level_name:?} ({error}), falling back to info");
    }
}

fn init_tracing_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer().compact().with_filter(env_filter).boxed(),
    };

    if tracing_subscriber::registry().with(log_layer).try_init().is_err() {
        warn!("Tracing subscriber already initialized, keeping the existing one");
    }
}

/// Parse a level name from configuration
pub fn parse_level(name: &str) -> Result<LevelFilter, tracing::level_filters::ParseLevelFilterError> {
    name.parse::<LevelFilter>()
}
