//! Component F: the datagram receiver (spec §4.F).
//!
//! A datagram is exactly one syslog message — no framing. Oversized
//! datagrams are truncated by the kernel and processed as-is.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::pipeline::Pipeline;
use syslog_runtime::{RuntimeError, ShutdownSignal};

/// Maximum UDP datagram size accepted (spec §4.F: "size <= 64 KiB").
const MAX_DATAGRAM: usize = 64 * 1024;

pub async fn bind(port: u16) -> Result<UdpSocket, RuntimeError> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    UdpSocket::bind(addr)
        .await
        .map_err(|source| RuntimeError::Bind {
            listener: "udp",
            addr: addr.to_string(),
            source,
        })
}

/// Receive loop: read one datagram, decode, hand the line to the pipeline.
/// Each datagram is processed on its own spawned task so a slow write never
/// stalls the next `recv_from`.
pub async fn run(socket: UdpSocket, pipeline: Arc<Pipeline>, mut shutdown: ShutdownSignal) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("udp receiver shutting down");
                break;
            }
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((n, peer)) => {
                        let line = String::from_utf8_lossy(&buf[..n]).into_owned();
                        let source_ip = peer.ip().to_string();
                        let pipeline = pipeline.clone();
                        tokio::spawn(async move {
                            pipeline.ingest(&line, &source_ip).await;
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "udp recv error");
                    }
                }
            }
        }
    }
}
