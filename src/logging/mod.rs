use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber, honoring `RUST_LOG` and falling
/// back to the supplied filter. Panics if a subscriber is already set; use
/// [`try_init`] where that is not acceptable.
pub fn init(default_filter: &str) {
    try_init(default_filter).expect("global tracing subscriber already set");
}

/// Fallible variant of [`init`], suitable for tests where several suites race
/// to install a subscriber.
pub fn try_init(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt().with_env_filter(filter).try_init()
}
