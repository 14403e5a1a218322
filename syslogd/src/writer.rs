//! Component E: severity-routed append of JSON lines to per-severity files.
//!
//! File handles are opened once and kept open; each write acquires that
//! file's own lock only across one line's write+flush, so concurrent
//! producers across transports never interleave a partial line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::message::{ParsedMessage, SEVERITY_NAMES};

/// Severity used when a record's severity name isn't one of the eight
/// known names (should not happen given [`crate::message::severity_name`],
/// but the writer routes defensively per spec §4.E).
const FALLBACK_SEVERITY: &str = "info";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

struct SeverityFile {
    path: PathBuf,
    handle: Mutex<File>,
}

/// Opens and holds one append-only file handle per severity name.
pub struct Writer {
    files: HashMap<&'static str, SeverityFile>,
}

impl Writer {
    /// Create the log directory if absent and open (or create) all eight
    /// severity files up front.
    pub async fn open(log_dir: impl AsRef<Path>) -> Result<Self, WriteError> {
        let log_dir = log_dir.as_ref();
        tokio::fs::create_dir_all(log_dir)
            .await
            .map_err(|source| WriteError::CreateDir {
                path: log_dir.to_path_buf(),
                source,
            })?;

        let mut files = HashMap::with_capacity(SEVERITY_NAMES.len());
        for &severity in SEVERITY_NAMES.iter() {
            let path = log_dir.join(format!("{severity}.log"));
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|source| WriteError::Open {
                    path: path.clone(),
                    source,
                })?;

            files.insert(
                severity,
                SeverityFile {
                    path,
                    handle: Mutex::new(handle),
                },
            );
        }

        Ok(Self { files })
    }

    /// Append `record` as one JSON line terminated by `\n` to its severity
    /// file, flushing immediately so followers (`tail -f`) see it promptly.
    /// Write failures are logged and do not propagate further than the
    /// record (spec §4.E, §7).
    pub async fn write(&self, record: &ParsedMessage) {
        if let Err(e) = self.try_write(record).await {
            tracing::error!(error = %e, severity = %record.severity, "failed to write record");
        }
    }

    async fn try_write(&self, record: &ParsedMessage) -> Result<(), WriteError> {
        let severity = record.severity.as_str();
        let target = self
            .files
            .get(severity)
            .or_else(|| {
                tracing::warn!(severity, "unknown severity, routing to info.log");
                self.files.get(FALLBACK_SEVERITY)
            })
            .expect("info.log is always opened");

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut handle = target.handle.lock().await;
        handle
            .write_all(&line)
            .await
            .map_err(|source| WriteError::Write {
                path: target.path.clone(),
                source,
            })?;
        handle.flush().await.map_err(|source| WriteError::Write {
            path: target.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::WireFormat;
    use std::io::BufRead;

    fn record(severity_priority: u8, message: &str) -> ParsedMessage {
        ParsedMessage::new(
            severity_priority,
            "2026-01-01T00:00:00Z".to_string(),
            "host".to_string(),
            message.to_string(),
            "127.0.0.1".to_string(),
            "2026-01-01T00:00:00.000000Z".to_string(),
            WireFormat::Rfc3164,
            "raw".to_string(),
        )
    }

    fn read_lines(path: &Path) -> Vec<String> {
        let file = std::fs::File::open(path).unwrap();
        std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect()
    }

    #[tokio::test]
    async fn creates_log_directory_and_all_eight_files() {
        let dir = tempdir();
        let writer = Writer::open(dir.path()).await.unwrap();
        assert_eq!(writer.files.len(), 8);
        for severity in SEVERITY_NAMES.iter() {
            assert!(dir.path().join(format!("{severity}.log")).exists());
        }
    }

    #[tokio::test]
    async fn writes_route_to_severity_named_file() {
        let dir = tempdir();
        let writer = Writer::open(dir.path()).await.unwrap();
        writer.write(&record(13, "notice body")).await; // user.notice

        let lines = read_lines(&dir.path().join("notice.log"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("notice body"));
        assert!(lines[0].contains("\"severity\":\"notice\""));
    }

    #[tokio::test]
    async fn every_line_is_valid_json_with_matching_severity() {
        let dir = tempdir();
        let writer = Writer::open(dir.path()).await.unwrap();
        for pri in 8u8..=15 {
            writer.write(&record(pri, "hi")).await;
        }

        for severity in SEVERITY_NAMES.iter() {
            let lines = read_lines(&dir.path().join(format!("{severity}.log")));
            assert_eq!(lines.len(), 1);
            let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
            assert_eq!(value["severity"], *severity);
        }
    }

    #[tokio::test]
    async fn concurrent_writes_to_same_file_never_interleave() {
        let dir = tempdir();
        let writer = std::sync::Arc::new(Writer::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..50 {
            let writer = writer.clone();
            handles.push(tokio::spawn(async move {
                writer.write(&record(13, &format!("msg-{i}"))).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let lines = read_lines(&dir.path().join("notice.log"));
        assert_eq!(lines.len(), 50);
        for line in &lines {
            assert!(serde_json::from_str::<serde_json::Value>(line).is_ok());
        }
    }

    struct TempDir(PathBuf);
    impl TempDir {
        fn path(&self) -> &Path {
            &self.0
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn tempdir() -> TempDir {
        let mut path = std::env::temp_dir();
        path.push(format!("syslogd-writer-test-{}", uniq_suffix()));
        TempDir(path)
    }

    fn uniq_suffix() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }
}
