//! Stderr logging setup, mirroring the teacher's `setup_stderr_logging` shape:
//! plain compact output by default, a verbose mode, and a spans-on-stderr toggle
//! for CLI tools that process a single file at a time.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber that writes to stderr.
///
/// `verbose` widens the default filter from `warn` to `debug` (used to surface
/// the rewriter's per-rule advisory notices from spec §7); `log_spans` turns on
/// span close events, useful when chasing down a runaway fixpoint loop.
pub fn setup_stderr_logging(verbose: bool, log_spans: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdx={default_level}")));

    let builder = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false);

    let result = if log_spans {
        builder
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        // A subscriber is already installed (e.g. in tests); that's fine.
    }
}
