//! Component G: the TLS stream acceptor and per-connection loop
//! (spec §4.G).

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::config::Settings;
use crate::framer::Framer;
use crate::pipeline::Pipeline;
use syslog_runtime::{RuntimeError, ShutdownSignal};

/// Fatal at startup: the process can't serve TLS without valid material
/// (spec §7 "Bind/TLS-init failure").
#[derive(Debug, Error)]
pub enum TlsSetupError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {0}")]
    NoCertificates(String),

    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Build a server-auth-only rustls config from a PEM certificate chain and
/// private key (grounded on the `with_no_client_auth` server pattern).
pub fn load_server_config(cert_file: &Path, key_file: &Path) -> Result<ServerConfig, TlsSetupError> {
    let certs = load_certs(cert_file)?;
    let key = load_private_key(key_file)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(config)
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsSetupError> {
    let file = File::open(path).map_err(|source| TlsSetupError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let certs: Vec<_> = rustls_pemfile::certs(&mut reader)
        .filter_map(Result::ok)
        .collect();
    if certs.is_empty() {
        return Err(TlsSetupError::NoCertificates(path.display().to_string()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsSetupError> {
    let file = File::open(path).map_err(|source| TlsSetupError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsSetupError::Read {
            path: path.display().to_string(),
            source,
        })?
        .ok_or_else(|| TlsSetupError::NoPrivateKey(path.display().to_string()))
}

pub async fn bind(port: u16) -> Result<TcpListener, RuntimeError> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    TcpListener::bind(addr)
        .await
        .map_err(|source| RuntimeError::Bind {
            listener: "tls",
            addr: addr.to_string(),
            source,
        })
}

/// Accept loop: handshake each connection, then spawn a per-connection task
/// that owns its own framer. Connections beyond `max_concurrent` are
/// accepted then immediately dropped with a logged warning.
pub async fn run(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    pipeline: Arc<Pipeline>,
    settings: Arc<Settings>,
    mut shutdown: ShutdownSignal,
) {
    let semaphore = Arc::new(Semaphore::new(settings.max_concurrent));

    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("tls acceptor shutting down");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::error!(error = %e, "tcp accept error");
                        continue;
                    }
                };

                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!(peer = %peer, limit = settings.max_concurrent, "max concurrent connections reached, closing");
                        drop(stream);
                        continue;
                    }
                };

                let acceptor = acceptor.clone();
                let pipeline = pipeline.clone();
                let settings = settings.clone();
                let mut conn_shutdown = shutdown.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            handle_connection(tls_stream, peer, pipeline, settings, &mut conn_shutdown).await;
                        }
                        Err(e) => {
                            tracing::warn!(peer = %peer, error = %e, "tls handshake failed");
                        }
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    mut stream: TlsStream<TcpStream>,
    peer: SocketAddr,
    pipeline: Arc<Pipeline>,
    settings: Arc<Settings>,
    shutdown: &mut ShutdownSignal,
) {
    let mut framer = Framer::with_limits(settings.max_buffer, settings.max_prefix, settings.max_frame);
    let mut buf = vec![0u8; settings.read_chunk];
    let source_ip = peer.ip().to_string();

    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::debug!(peer = %peer, "connection closing: shutdown");
                break;
            }
            read = tokio::time::timeout(settings.read_timeout, stream.read(&mut buf)) => {
                let n = match read {
                    Ok(Ok(n)) => n,
                    Ok(Err(e)) => {
                        tracing::warn!(peer = %peer, error = %e, "read error");
                        break;
                    }
                    Err(_) => {
                        tracing::debug!(peer = %peer, "read timeout, closing connection");
                        break;
                    }
                };

                if n == 0 {
                    tracing::debug!(peer = %peer, "peer closed connection");
                    break;
                }

                match framer.feed(&buf[..n]) {
                    Ok(frames) => {
                        for frame in frames {
                            pipeline.ingest(&frame, &source_ip).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!(peer = %peer, reason = e.reason(), error = %e, "framing error, closing connection");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_server_config_errors_on_missing_file() {
        let err = load_server_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"));
        assert!(err.is_err());
    }
}
