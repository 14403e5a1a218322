//! Process lifecycle support for the syslog collector.
//!
//! This crate provides:
//! - [`Args`] for the collector's CLI override flags
//! - [`Supervisor`]/[`ShutdownSignal`] for task spawning and coordinated
//!   shutdown on SIGINT/SIGTERM
//! - [`RuntimeError`] for lifecycle-level failures (bind errors, worker
//!   failures)

mod args;
mod error;
mod runner;

pub use args::Args;
pub use error::{Result, RuntimeError};
pub use runner::{DEFAULT_SHUTDOWN_GRACE, ShutdownSignal, Supervisor};
