use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor an explicit filter is given.
pub const DEFAULT_FILTER: &str = "info,rowbind_data=debug";

/// Initialise the global `tracing` subscriber with a standard `fmt` layer.
///
/// Respects the `RUST_LOG` environment variable and falls back to `filter`
/// (or [`DEFAULT_FILTER`]) otherwise. Returns `false` when a global
/// subscriber was already installed.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok()
}

/// Initialise tracing from `rowbind.log.filter`.
pub fn init_from_config(config: &crate::config::Config) -> bool {
    let filter: Option<String> = config.get("rowbind.log.filter").ok();
    init_tracing(filter.as_deref())
}
