//! Minimal Telegram Bot API transport.
//!
//! Long-polls `getUpdates` and answers with `sendMessage`. Only text messages
//! matter here; every other update kind is skipped. The bot token is part of
//! the request path, so transport errors are stripped of their URL before
//! they can reach a log line.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use kotik_types::{ApiKey, UserId};

pub const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

const LONG_POLL_SECS: u64 = 25;
// Must outlive the long poll or every empty poll becomes a timeout error.
const HTTP_TIMEOUT_SECS: u64 = 35;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("telegram api rejected the call: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub text: Option<String>,
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &ApiKey) -> Result<Self, reqwest::Error> {
        Self::with_base_url(TELEGRAM_API_BASE_URL, token)
    }

    /// Same as [`TelegramClient::new`] with an overridable base URL for tests
    /// against a local mock server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: &ApiKey,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.expose_secret().to_string(),
        })
    }

    /// Long-poll for new updates, acknowledging everything before `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let url = format!("{}/bot{}/getUpdates", self.base_url, self.token);
        let mut body = serde_json::json!({
            "timeout": LONG_POLL_SECS,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = offset.into();
        }

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        read_envelope(response).await
    }

    pub async fn send_message(&self, chat: UserId, text: &str) -> Result<(), TelegramError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let body = serde_json::json!({
            "chat_id": chat.value(),
            "text": text,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        read_envelope::<serde_json::Value>(response).await?;
        Ok(())
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TelegramError> {
    let status = response.status();
    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| TelegramError::Http(e.without_url()))?;
    if !envelope.ok {
        return Err(TelegramError::Api(
            envelope
                .description
                .unwrap_or_else(|| format!("status {status}")),
        ));
    }
    envelope
        .result
        .ok_or_else(|| TelegramError::Api("response carries no result".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::with_base_url(server.uri(), &ApiKey::new("TEST-TOKEN")).unwrap()
    }

    #[tokio::test]
    async fn get_updates_parses_text_messages_and_skips_the_rest() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/botTEST-TOKEN/getUpdates"))
            .and(body_partial_json(serde_json::json!({
                "offset": 5,
                "timeout": 25,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {"update_id": 5, "message": {"text": "мяу", "chat": {"id": 7}}},
                    {"update_id": 6, "message": {"chat": {"id": 8}, "sticker": {}}},
                    {"update_id": 7},
                ],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = client(&server).get_updates(Some(5)).await.unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("мяу")
        );
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 7);
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
        assert!(updates[2].message.is_none());
    }

    #[tokio::test]
    async fn send_message_posts_chat_and_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/botTEST-TOKEN/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 7,
                "text": "Мур-мур!",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 1},
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .send_message(UserId::new(7), "Мур-мур!")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn api_rejection_surfaces_the_description() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/botTEST-TOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized",
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_message(UserId::new(7), "мяу")
            .await
            .unwrap_err();
        match err {
            TelegramError::Api(description) => assert_eq!(description, "Unauthorized"),
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
