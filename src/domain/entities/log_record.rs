use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use super::InboundEvent;

/// Result of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Ok,
    UnknownCommand,
    AccessDenied,
    BlockedByPolicy,
    Error { detail: String },
}

impl Outcome {
    pub fn error(detail: impl Into<String>) -> Self {
        Outcome::Error { detail: detail.into() }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Ok => "ok",
            Outcome::UnknownCommand => "unknown-command",
            Outcome::AccessDenied => "access-denied",
            Outcome::BlockedByPolicy => "blocked-by-policy",
            Outcome::Error { .. } => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Error { detail } => write!(f, "error: {}", detail),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One append-only record per dispatch attempt, rejected ones included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub sender_id: i64,
    pub sender_name: Option<String>,
    pub args: Vec<String>,
    pub outcome: Outcome,
    pub response_ms: Option<u64>,
}

impl LogRecord {
    pub fn new(event: &InboundEvent, command: impl Into<String>, args: &[String], outcome: Outcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            command: command.into(),
            chat_id: event.chat.id,
            chat_title: event.chat.title.clone(),
            sender_id: event.sender.id,
            sender_name: event.sender.name.clone(),
            args: args.to_vec(),
            outcome,
            response_ms: None,
        }
    }

    pub fn with_response_time(mut self, elapsed: Duration) -> Self {
        self.response_ms = Some(elapsed.as_millis() as u64);
        self
    }
}
