//! Syslog collection endpoint: UDP and TLS receivers feeding a shared
//! parse -> dedup -> write pipeline.
//!
//! # Supported formats
//!
//! - RFC 3164 (BSD syslog)
//! - RFC 5424 (structured syslog)
//!
//! # Output
//!
//! Accepted records are appended as JSON lines to `<log_dir>/<severity>.log`,
//! one file per severity (spec §4.E).

pub mod config;
pub mod dedup;
pub mod framer;
pub mod message;
pub mod parser;
pub mod pipeline;
pub mod tls;
pub mod udp;
pub mod writer;
