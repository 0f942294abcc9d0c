use tracing_subscriber::EnvFilter;

pub(crate) const RUST_LOG: &str = "RUST_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Builds the log filter from a `RUST_LOG`-style directive string.
///
/// An unset, empty or unparseable value yields the `info` default; the noisy
/// connection-level logs of `hyper` are capped at `warn` unless the caller
/// names `hyper` explicitly.
pub fn log_filter(directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    let filter = match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))?,
        None => EnvFilter::try_new(DEFAULT_DIRECTIVE)?,
    };

    let mentions_hyper = directives.is_some_and(|d| d.contains("hyper"));
    Ok(if mentions_hyper {
        filter
    } else {
        filter.add_directive("hyper=warn".parse()?)
    })
}
