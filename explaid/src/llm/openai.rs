//! OpenAI client for the Responses API.
//!
//! Minimal, non-streaming client:
//! - POST {endpoint}/v1/responses with `model`, `instructions`, `input`
//!
//! Constructor validation:
//! - an API key must be present
//! - the endpoint must start with http:// or https://

use super::{LanguageModel, ModelTag};
use crate::config::AppConfig;
use crate::errors::ModelError;
use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

const SNIPPET_CHARS: usize = 200;

/// Client for one OpenAI model.
#[derive(Debug)]
pub struct OpenAiModel {
    client: reqwest::Client,
    tag: ModelTag,
    url_responses: String,
    timeout: Duration,
}

impl OpenAiModel {
    /// Creates a client.
    ///
    /// # Errors
    /// - [`ModelError::MissingApiKey`] if `api_key` is `None` or blank
    /// - [`ModelError::InvalidEndpoint`] if `endpoint` is not an http(s) URL
    /// - [`ModelError::Transport`] if the HTTP client cannot be built
    pub fn new(
        tag: ModelTag,
        endpoint: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingApiKey)?;

        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ModelError::InvalidEndpoint(endpoint.to_string()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| ModelError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_responses = format!("{}/v1/responses", endpoint.trim_end_matches('/'));

        info!(model = %tag, %endpoint, timeout_secs = timeout.as_secs(), "OpenAiModel initialized");

        Ok(Self {
            client,
            tag,
            url_responses,
            timeout,
        })
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    /// See [`OpenAiModel::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ModelError> {
        Self::new(
            config.model,
            &config.endpoint,
            config.api_key.as_deref(),
            config.timeout(),
        )
    }

    /// The URL requests are sent to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url_responses
    }

    fn map_send_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.timeout)
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn tag(&self) -> ModelTag {
        self.tag
    }

    async fn prompt(&self, instructions: &str, input: &str) -> Result<String, ModelError> {
        let started = Instant::now();
        let body = ResponsesRequest {
            model: self.tag.openai_name(),
            instructions,
            input,
        };

        debug!(model = %self.tag, input_len = input.len(), "POST {}", self.url_responses);

        let resp = self
            .client
            .post(&self.url_responses)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %snippet,
                model = %self.tag,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/responses returned non-success status"
            );
            return Err(ModelError::Status {
                status: status.as_u16(),
                snippet,
            });
        }

        let out: ResponsesResponse = resp.json().await.map_err(|e| {
            ModelError::Decode(format!("serde error: {e}; expected `output_text` or `output[].content[].text`"))
        })?;

        let answer = out.answer().ok_or(ModelError::EmptyAnswer)?;

        info!(
            model = %self.tag,
            answer_len = answer.len(),
            latency_ms = started.elapsed().as_millis(),
            "model answered"
        );
        Ok(answer)
    }
}

/// Truncates a response body for error messages.
#[must_use]
pub fn make_snippet(text: &str) -> String {
    let compact: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() > SNIPPET_CHARS {
        let cut: String = compact.chars().take(SNIPPET_CHARS).collect();
        format!("{cut}…")
    } else {
        compact
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    fn answer(self) -> Option<String> {
        let text = match self.output_text {
            Some(text) => text,
            None => self
                .output
                .into_iter()
                .flat_map(|item| item.content)
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join(""),
        };
        (!text.trim().is_empty()).then_some(text)
    }
}
