//! Tracing subscriber setup for the binary.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Parse a level name such as `debug`, falling back to `info`.
pub fn level_filter(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::INFO)
}

/// Install a stderr fmt subscriber. `RUST_LOG` wins over `level`.
/// A second call is a no-op.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level_filter(level).into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .with_writer(std::io::stderr)
        .try_init();
}
