//! Tracing subscriber setup for binaries and hosts.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host. [`init_tracing`] is the default used by the CLI.

use crate::config::Config;
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber using the config's level and format.
///
/// `RUST_LOG` directives take precedence over `config.log_level`. Returns
/// `false` if a global subscriber was already installed.
pub fn init_tracing(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if config.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.is_ok()
}
