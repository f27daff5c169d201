//! Tracing setup for the binary.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

/// Filter built from `RUST_LOG`-style directives, falling back to `info`.
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Install the global subscriber. Call once, before anything logs.
///
/// Diagnostics go to stderr so stdout carries only pod event lines.
pub fn init() {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(&std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default()));

    registry().with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_info() {
        assert_eq!(env_filter("").max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(env_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(env_filter("not a directive").max_level_hint(), Some(LevelFilter::INFO));
    }
}
