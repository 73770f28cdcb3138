use tracing_subscriber::EnvFilter;

use crate::config::ShimConfig;

/// Install a fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_filter))
        .with_target(true)
        .try_init();
}

/// [`init_tracing`] with the configured `log_filter` as the default.
pub fn init_from_config(config: &ShimConfig) {
    init_tracing(&config.log_filter);
}

/// Filter taken from `RUST_LOG`, or `default_filter` when it is unset or
/// unparsable.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_is_the_default() {
        std::env::remove_var("RUST_LOG");
        let config = ShimConfig {
            log_filter: "scriptshim=debug".to_string(),
            ..ShimConfig::default()
        };
        assert_eq!(env_filter(&config.log_filter).to_string(), "scriptshim=debug");
        assert_eq!(env_filter(&ShimConfig::default().log_filter).to_string(), "info");

        init_from_config(&config);
        init_from_config(&ShimConfig::default());
    }
}
