//! Shared support crate for the syslog collector binaries.
//!
//! - [`error`] — the common [`Error`]/[`Result`] pair.
//! - [`config`] — [`LoggingConfig`] plus small environment-variable helpers.
//!
//! [`init_tracing`] wires [`LoggingConfig`] into a `tracing_subscriber`
//! registry; every binary built on top of this crate calls it once at
//! startup before doing anything else observable.

pub mod config;
pub mod error;

pub use config::{LogFormat, LoggingConfig};
pub use error::{Error, Result};

/// Initialize the global tracing subscriber from a [`LoggingConfig`].
///
/// Respects `RUST_LOG` when set; otherwise filters at `config.level`.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("failed to initialize tracing: {e}")))
}
