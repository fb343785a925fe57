use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Sets up the global tracing subscriber with a fmt formatter and env filter.
///
/// `RUST_LOG` wins over `default_filter`. `LOG_FORMAT=compact` drops the
/// file/line annotations for schedulers that capture single-line output.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let compact = std::env::var("LOG_FORMAT")
        .map(|v| v.trim().eq_ignore_ascii_case("compact"))
        .unwrap_or(false);

    let builder = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true);
    let result = if compact {
        builder.compact().try_init()
    } else {
        builder.with_line_number(true).with_file(true).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
