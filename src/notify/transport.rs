use std::collections::HashSet;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("messaging API rejected the message ({code}): {description}")]
    Rejected { code: u16, description: String },
}

/// Outbound messaging, addressed by chat id. One call is one delivery
/// attempt; implementations do not retry.
pub trait MessageTransport: Send + Sync {
    fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), TransportError>;
}

/// One recorded delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub photo: Option<String>,
    pub text: String,
    pub delivered: bool,
}

/// In-memory transport for tests: records every attempt and fails
/// for chat ids registered with `fail_for`.
#[derive(Default)]
pub struct RecordingTransport {
    attempts: Mutex<Vec<SentMessage>>,
    failing: HashSet<i64>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(mut self, chat_id: i64) -> Self {
        self.failing.insert(chat_id);
        self
    }

    pub fn attempts(&self) -> Vec<SentMessage> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn attempts_to(&self, chat_id: i64) -> Vec<SentMessage> {
        self.attempts()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    fn record(&self, chat_id: i64, photo: Option<&str>, text: &str) -> Result<(), TransportError> {
        let delivered = !self.failing.contains(&chat_id);
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentMessage {
                chat_id,
                photo: photo.map(String::from),
                text: text.to_string(),
                delivered,
            });
        if delivered {
            Ok(())
        } else {
            Err(TransportError::Rejected {
                code: 403,
                description: "Forbidden: bot was blocked by the user".into(),
            })
        }
    }
}

impl MessageTransport for RecordingTransport {
    fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.record(chat_id, None, text)
    }

    fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), TransportError> {
        self.record(chat_id, Some(photo), caption)
    }
}
