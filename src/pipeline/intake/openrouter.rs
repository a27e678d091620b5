use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompt::EXTRACTION_TEMPERATURE;
use super::types::ExtractionClient;
use super::{FailureReason, IntakeError};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3-8b-instruct";
/// Upper bound on one extraction request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for an OpenAI-compatible chat-completions endpoint
/// (OpenRouter by default).
pub struct ChatCompletionClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ChatCompletionClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ExtractionClient for ChatCompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, IntakeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: EXTRACTION_TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    FailureReason::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    FailureReason::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FailureReason::HttpStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: ChatResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                FailureReason::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FailureReason::MalformedResponse(e.to_string())
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                IntakeError::from(FailureReason::MalformedResponse(
                    "completion has no content".into(),
                ))
            })
    }
}

/// Mock extraction client for testing: returns a configured answer
/// or failure and counts calls.
pub struct MockExtractionClient {
    result: Result<String, IntakeError>,
    calls: AtomicUsize,
}

impl MockExtractionClient {
    pub fn new(response: &str) -> Self {
        Self {
            result: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: FailureReason) -> Self {
        Self {
            result: Err(IntakeError::NormalizationFailed(reason)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExtractionClient for MockExtractionClient {
    fn complete(&self, _system: &str, _user: &str) -> Result<String, IntakeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
