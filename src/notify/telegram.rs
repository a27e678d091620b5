use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::transport::{MessageTransport, TransportError};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Per-request timeout for Bot API calls.
pub const SEND_TIMEOUT_SECS: u64 = 15;

/// Telegram Bot API transport (`sendMessage` / `sendPhoto`).
pub struct TelegramTransport {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl TelegramTransport {
    pub fn new(token: &str) -> Result<Self, reqwest::Error> {
        Self::with_base_url(TELEGRAM_API_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn call<T: Serialize>(&self, method: &str, body: &T) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    // Drop the URL: it carries the bot token.
                    TransportError::Http(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let parsed: Option<BotApiResponse> = response.json().ok();

        match parsed {
            Some(BotApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(BotApiResponse { description, .. }) => Err(TransportError::Rejected {
                code: status.as_u16(),
                description: description.unwrap_or_default(),
            }),
            None => Err(TransportError::Rejected {
                code: status.as_u16(),
                description: "unreadable Bot API response".into(),
            }),
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: i64,
    photo: &'a str,
    caption: &'a str,
}

#[derive(Deserialize)]
struct BotApiResponse {
    ok: bool,
    description: Option<String>,
}

impl MessageTransport for TelegramTransport {
    fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.call("sendMessage", &SendMessage { chat_id, text })
    }

    fn send_photo(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), TransportError> {
        self.call(
            "sendPhoto",
            &SendPhoto {
                chat_id,
                photo,
                caption,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_token() {
        let transport = TelegramTransport::with_base_url("https://api.telegram.org/", "123:abc").unwrap();
        assert_eq!(
            transport.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn photo_body_uses_caption_field() {
        let body = SendPhoto {
            chat_id: 42,
            photo: "AgACAgIAAxk",
            caption: "текст",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chat_id"], 42);
        assert_eq!(json["photo"], "AgACAgIAAxk");
        assert_eq!(json["caption"], "текст");
    }

    #[test]
    fn api_error_response_parses() {
        let parsed: BotApiResponse =
            serde_json::from_str(r#"{"ok": false, "error_code": 403, "description": "Forbidden"}"#)
                .unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.description.as_deref(), Some("Forbidden"));
    }

    #[test]
    fn unreachable_api_is_http_error_without_token() {
        let transport = TelegramTransport::with_base_url("http://127.0.0.1:9", "secret-token").unwrap();
        let err = transport.send_text(1, "hi").unwrap_err();
        match err {
            TransportError::Http(msg) => assert!(!msg.contains("secret-token")),
            TransportError::Timeout => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
