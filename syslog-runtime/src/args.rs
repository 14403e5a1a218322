//! CLI argument parsing.
//!
//! The collector is configured primarily through the environment (spec §6);
//! these flags exist purely as local override knobs, mirroring how bridges
//! in this lineage pair env/file config with a CLI escape hatch.

use clap::Parser;

/// Command-line overrides for the syslog collector.
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Syslog collection endpoint (UDP + TLS)")]
pub struct Args {
    /// Override the logging level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override the output directory for severity log files.
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Override the UDP bind port.
    #[arg(long)]
    pub udp_port: Option<u16>,

    /// Override the TLS bind port.
    #[arg(long)]
    pub tls_port: Option<u16>,
}

impl Args {
    /// Parse CLI arguments from `std::env::args`.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_have_no_overrides() {
        let args = Args::default();
        assert!(args.log_level.is_none());
        assert!(args.log_dir.is_none());
        assert!(args.udp_port.is_none());
        assert!(args.tls_port.is_none());
    }
}
