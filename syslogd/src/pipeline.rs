//! The straight-line B -> D -> E pipeline shared by both receivers
//! (spec §2 dataflow, §9 "no plugin/dispatch layers").

use std::sync::Arc;

use crate::dedup::Deduplicator;
use crate::parser;
use crate::writer::Writer;

/// Sink shared by the datagram receiver and the stream acceptor: hand it a
/// decoded text line and the peer's address, it does the rest.
#[derive(Clone)]
pub struct Pipeline {
    dedup: Arc<Deduplicator>,
    writer: Arc<Writer>,
}

impl Pipeline {
    pub fn new(dedup: Arc<Deduplicator>, writer: Arc<Writer>) -> Self {
        Self { dedup, writer }
    }

    /// Parse, dedup, and (if accepted) persist one wire line.
    pub async fn ingest(&self, raw: &str, source_ip: &str) {
        let received_at = now_iso8601();
        let record = parser::parse(raw, source_ip, &received_at);

        if self.dedup.accept(&record) {
            self.writer.write(&record).await;
        } else {
            tracing::debug!(source_ip, priority = record.priority, "duplicate suppressed");
        }
    }
}

fn now_iso8601() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Writer;

    struct TempDir(std::path::PathBuf);
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn tempdir() -> TempDir {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "syslogd-pipeline-test-{}",
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        TempDir(path)
    }

    #[tokio::test]
    async fn accepted_record_is_written_duplicate_is_not() {
        let dir = tempdir();
        let writer = Arc::new(Writer::open(&dir.0).await.unwrap());
        let dedup = Arc::new(Deduplicator::new());
        let pipeline = Pipeline::new(dedup, writer);

        pipeline
            .ingest("<13>Oct 31 12:00:00 server01 Test message", "10.0.0.1")
            .await;
        pipeline
            .ingest("<13>Oct 31 12:00:00 server01 Test message", "10.0.0.1")
            .await;

        let content = std::fs::read_to_string(dir.0.join("notice.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
