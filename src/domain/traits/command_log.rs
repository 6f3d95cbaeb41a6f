use crate::domain::entities::LogRecord;

/// Append-only sink for dispatch log records
pub trait CommandLog: Send + Sync {
    fn append(&self, record: &LogRecord);
}
