//! Syslog collection endpoint.
//!
//! Starts the datagram receiver and/or the TLS stream acceptor per
//! `Settings`, runs them to completion, and shuts down cleanly on
//! SIGINT/SIGTERM (spec §4.H, §6 "Process lifecycle").

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio_rustls::TlsAcceptor;

use syslog_runtime::{Args, RuntimeError, Supervisor};
use syslogd::config::Settings;
use syslogd::dedup::Deduplicator;
use syslogd::pipeline::Pipeline;
use syslogd::writer::Writer;
use syslogd::{tls, udp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env().apply_args(&args);

    syslog_core::init_tracing(&settings.logging).context("failed to initialize logging")?;

    settings
        .validate()
        .map_err(RuntimeError::validation)
        .context("invalid configuration")?;

    tracing::info!(
        udp_port = settings.udp_port,
        tls_port = settings.tls_port,
        log_dir = %settings.log_dir,
        enable_udp = settings.enable_udp,
        enable_tls = settings.enable_tls,
        "starting syslog collector"
    );

    let writer = Arc::new(
        Writer::open(&settings.log_dir)
            .await
            .with_context(|| format!("failed to open log directory {}", settings.log_dir))?,
    );
    let dedup = Arc::new(Deduplicator::with_params(settings.window, settings.max_entries));
    let pipeline = Arc::new(Pipeline::new(dedup, writer));

    let settings = Arc::new(settings);
    let mut supervisor = Supervisor::with_grace("syslogd", settings.shutdown_grace);

    if settings.enable_udp {
        let socket = udp::bind(settings.udp_port)
            .await
            .with_context(|| format!("failed to bind UDP port {}", settings.udp_port))?;
        tracing::info!(port = settings.udp_port, "udp receiver listening");

        let pipeline = pipeline.clone();
        let shutdown = supervisor.shutdown_signal();
        supervisor.spawn(async move {
            udp::run(socket, pipeline, shutdown).await;
        });
    }

    if settings.enable_tls {
        let server_config = tls::load_server_config(
            Path::new(&settings.cert_file),
            Path::new(&settings.key_file),
        )
        .with_context(|| {
            format!(
                "failed to load TLS material from {} / {}",
                settings.cert_file, settings.key_file
            )
        })?;
        let acceptor = TlsAcceptor::from(Arc::new(server_config));

        let listener = tls::bind(settings.tls_port)
            .await
            .with_context(|| format!("failed to bind TLS port {}", settings.tls_port))?;
        tracing::info!(port = settings.tls_port, "tls acceptor listening");

        let pipeline = pipeline.clone();
        let settings_for_tls = settings.clone();
        let shutdown = supervisor.shutdown_signal();
        supervisor.spawn(async move {
            tls::run(listener, acceptor, pipeline, settings_for_tls, shutdown).await;
        });
    }

    supervisor.run_until_signal().await;

    tracing::info!("syslog collector stopped");
    Ok(())
}
