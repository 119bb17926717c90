//! Shared tracing setup for the sitewatch binaries.

mod subscriber;

pub use subscriber::{init_tracing_from_config, parse_level};
