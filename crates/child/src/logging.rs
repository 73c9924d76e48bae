//! Log subscriber setup for binaries and test harnesses embedding the child
//! module

use std::env;

use eyre::{Result, WrapErr};
use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::fmt::Subscriber;

/// Environment variable holding the log filter directives
pub const ENV_KEY: &str = "CCV_LOG";

/// Install a global subscriber filtered by [`ENV_KEY`], falling back to the
/// given directive
pub fn init_from_env_or(default: impl Into<Directive>) -> Result<()> {
    let filter = filter_from_env_or(default);
    set_subscriber(filter)
}

/// The filter from [`ENV_KEY`], or the given directive if it's not set
pub fn filter_from_env_or(default: impl Into<Directive>) -> EnvFilter {
    env::var(ENV_KEY)
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default.into()))
}

/// Install a global subscriber with the given filter
pub fn set_subscriber(filter: EnvFilter) -> Result<()> {
    let my_collector = Subscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(my_collector)
        .wrap_err("Failed to set log subscriber")
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn test_filter_falls_back_to_default() {
        // Only meaningful when the variable isn't set by the caller
        if env::var(ENV_KEY).is_err() {
            let filter = filter_from_env_or(LevelFilter::DEBUG);
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        }
    }
}
