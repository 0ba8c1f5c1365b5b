// ABOUTME: Shared logging setup for ghcert binaries
// ABOUTME: init_for() installs crate-filtered stderr logging at a chosen verbosity

use tracing_subscriber::EnvFilter;

/// Crate-filtered logging to stderr. Default: WARN for everything else and
/// `level` for each of the named crates. A non-empty RUST_LOG replaces the
/// default entirely.
///
/// Used by the CLI so that progress output on stdout stays readable while
/// `--verbose` can still surface protocol-level detail.
pub fn init_for(crate_names: &[&str], level: tracing::Level) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(rust_log.as_deref(), crate_names, level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn filter_for(rust_log: Option<&str>, crate_names: &[&str], level: tracing::Level) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::new(directives);
    }

    let mut filter = EnvFilter::new("warn");
    for name in crate_names {
        let directive = format!("{name}={level}");
        filter = filter.add_directive(
            directive
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );
    }
    filter
}
