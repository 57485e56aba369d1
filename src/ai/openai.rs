//! OpenAI chat-completions summarizer.
//!
//! Streams the analysis as server-sent events and accumulates the delta
//! fragments into one result string. The whole call, stream included, is
//! bounded by a single timeout.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Summarizer, SummaryError};
use crate::core::{DEFAULT_MODEL, DEFAULT_OPENAI_BASE_URL};

const SYSTEM_PROMPT: &str = "Analyze the following comments from a checklist:";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Streaming summarizer against an OpenAI-compatible endpoint.
pub struct OpenAiSummarizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiSummarizer {
    /// Create a summarizer with the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a custom base URL (Azure OpenAI or compatible APIs).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Bound the whole request, stream included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn stream_completion(&self, transcript: &str) -> Result<String, SummaryError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: transcript.to_string() },
            ],
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Api { status, body });
        }

        let mut stream = response.bytes_stream();
        let mut pending = String::new();
        let mut result = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            pending.push_str(&String::from_utf8_lossy(&chunk));

            // Drain complete SSE lines; a partial line stays buffered.
            while let Some(newline) = pending.find('\n') {
                let line = pending[..newline].trim().to_string();
                pending.drain(..=newline);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    return Ok(result);
                }

                let event: StreamEvent = serde_json::from_str(data)
                    .map_err(|e| SummaryError::MalformedStream(e.to_string()))?;
                if let Some(delta) =
                    event.choices.first().and_then(|c| c.delta.content.as_deref())
                {
                    result.push_str(delta);
                }
            }
        }

        // Stream ended without the [DONE] sentinel.
        if result.is_empty() {
            return Err(SummaryError::MalformedStream(
                "stream closed before any content".to_string(),
            ));
        }
        Ok(result)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, SummaryError> {
        match tokio::time::timeout(self.timeout, self.stream_completion(transcript)).await {
            Ok(result) => result,
            Err(_) => Err(SummaryError::Timeout),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}
