use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, registry};

mod env;

pub use env::log_filter;

/// Sets a plain-text `fmt` subscriber writing to stderr as the global default.
///
/// Verbosity follows `RUST_LOG`, falling back to `info` so that startup and
/// per-request lines are visible without any configuration.
pub fn init_globally() -> anyhow::Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_filter(log_filter(std::env::var(env::RUST_LOG).ok().as_deref())?);

    registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set global tracing subscriber: {e}"))
}
