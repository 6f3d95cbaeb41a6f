//! Command log sinks

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::domain::entities::LogRecord;
use crate::domain::traits::CommandLog;

/// Appends JSON lines to `<dir>/commands-YYYY-MM-DD.log`.
///
/// Inside a tokio runtime the file write runs on the blocking pool;
/// outside one it happens inline.
pub struct FileCommandLog {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileCommandLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// File the given day's records go to
    pub fn file_for(&self, date: chrono::NaiveDate) -> PathBuf {
        day_file(&self.dir, date)
    }
}

fn day_file(dir: &Path, date: chrono::NaiveDate) -> PathBuf {
    dir.join(format!("commands-{}.log", date.format("%Y-%m-%d")))
}

fn write_line(dir: &Path, lock: &Mutex<()>, record: &LogRecord) {
    if let Err(e) = append_line(dir, lock, record) {
        tracing::warn!("Failed to append command log in {}: {}", dir.display(), e);
    }
}

fn append_line(dir: &Path, lock: &Mutex<()>, record: &LogRecord) -> std::io::Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());
    std::fs::create_dir_all(dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(day_file(dir, Utc::now().date_naive()))?;
    file.write_all(line.as_bytes())
}

impl CommandLog for FileCommandLog {
    fn append(&self, record: &LogRecord) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let dir = self.dir.clone();
                let lock = Arc::clone(&self.write_lock);
                let record = record.clone();
                handle.spawn_blocking(move || write_line(&dir, &lock, &record));
            }
            Err(_) => write_line(&self.dir, &self.write_lock, record),
        }
    }
}

/// Keeps records in memory, in append order
#[derive(Default)]
pub struct MemoryCommandLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryCommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CommandLog for MemoryCommandLog {
    fn append(&self, record: &LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}

/// Discards records; tracing output still happens upstream
pub struct NoopCommandLog;

impl CommandLog for NoopCommandLog {
    fn append(&self, _record: &LogRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Chat, InboundEvent, Outcome, Sender};
    use tempfile::TempDir;

    #[test]
    fn test_file_log_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let log = FileCommandLog::new(dir.path().join("logs"));
        let event = InboundEvent::new(Chat::group(-5, "devs"), Sender::new(3).with_name("ann"), ".ping");

        log.append(&LogRecord::new(&event, "ping", &[], Outcome::Ok));
        log.append(&LogRecord::new(&event, "nope", &[], Outcome::UnknownCommand));

        let content = std::fs::read_to_string(log.file_for(Utc::now().date_naive())).unwrap();
        let records: Vec<LogRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chat_title.as_deref(), Some("devs"));
        assert_eq!(records[1].outcome, Outcome::UnknownCommand);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_file_log_writes_off_the_runtime() {
        let dir = TempDir::new().unwrap();
        let log = FileCommandLog::new(dir.path().join("logs"));
        let event = InboundEvent::new(Chat::private(3), Sender::new(3), ".ping");

        log.append(&LogRecord::new(&event, "ping", &[], Outcome::Ok));

        let path = log.file_for(Utc::now().date_naive());
        let mut content = String::new();
        for _ in 0..100 {
            content = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            if content.ends_with('\n') {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let record: LogRecord = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(record.command, "ping");
    }
}
