//! Remote completion client.
//!
//! [`CompletionClient`] sends an ordered turn list to a chat-completions
//! endpoint described by a [`ProviderDescriptor`] and extracts the generated
//! text. Failures are classified into [`CompletionError`] variants so the
//! caller can decide what a failure means. The client itself never retries;
//! fallback ordering across providers belongs to the resolution pipeline.
//!
//! Generation parameters are fixed constants, not computed: the relay always
//! asks for the same output length and sampling temperature.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use kotik_types::{ApiKey, ProviderDescriptor, Turn};

/// Maximum completion length requested from every provider.
pub const MAX_OUTPUT_TOKENS: u32 = 512;
/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 0.8;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;
const MAX_LOGGED_PAYLOAD_BYTES: usize = 2 * 1024;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The request never produced an HTTP response (connect failure, timeout).
    #[error("completion transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned status {status}")]
    Upstream { status: u16, body: String },
    /// The endpoint answered 2xx but the body is not a usable completion.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Whether this failure carries a quota/rate-limit signal (HTTP 429).
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CompletionError::Upstream { status: 429, .. })
    }
}

/// Client for chat-completions endpoints.
///
/// One `reqwest` client is built at construction with the fixed request
/// timeout, so a hung provider is bounded and surfaces as
/// [`CompletionError::Transport`].
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: ApiKey,
    referer: Option<String>,
}

impl CompletionClient {
    /// `referer` is sent as an `HTTP-Referer` header when present; OpenRouter
    /// uses it for request attribution.
    pub fn new(
        api_key: ApiKey,
        timeout: Duration,
        referer: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            api_key,
            referer,
        })
    }

    /// Request one completion for `turns` from `provider`.
    ///
    /// Logs the raw error payload (capped) on any non-success response; the
    /// authorization credential never reaches a log line.
    pub async fn complete(
        &self,
        turns: &[Turn],
        provider: &ProviderDescriptor,
    ) -> Result<String, CompletionError> {
        let body = serde_json::json!({
            "model": provider.model,
            "messages": turns,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "temperature": TEMPERATURE,
        });

        let mut request = self
            .http
            .post(&provider.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::error!(
                provider = %provider.name,
                status = status.as_u16(),
                body = %body,
                "completion endpoint returned an error"
            );
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.without_url()))?;
        extract_completion_text(&raw).map_err(|err| {
            tracing::error!(
                provider = %provider.name,
                error = %err,
                payload = %truncate_for_log(&raw),
                "completion response could not be parsed"
            );
            err
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn extract_completion_text(raw: &str) -> Result<String, CompletionError> {
    let payload: ChatCompletion = serde_json::from_str(raw)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
    let Some(choice) = payload.choices.into_iter().next() else {
        return Err(CompletionError::MalformedResponse(
            "response carries no choices".to_string(),
        ));
    };
    let Some(message) = choice.message else {
        return Err(CompletionError::MalformedResponse(
            "choice carries no message".to_string(),
        ));
    };
    message.content.ok_or_else(|| {
        CompletionError::MalformedResponse("message carries no content".to_string())
    })
}

/// Read an error body without buffering more than the cap.
async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

fn truncate_for_log(raw: &str) -> &str {
    let mut end = raw.len().min(MAX_LOGGED_PAYLOAD_BYTES);
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}
