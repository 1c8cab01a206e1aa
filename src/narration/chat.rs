use super::dialect::{ChatDialect, Dialect};
use super::prompt::build_route_prompt;
use super::Narrator;
use crate::config::{ApiKey, NarratorConfig};
use crate::quote::summary::QuoteSummary;
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

/// Non-2xx answer from the chat API.
#[derive(Error, Debug)]
#[error("Chat completion failed with status {status}: {detail}")]
struct ChatRejected {
    status: StatusCode,
    detail: String,
}

/// Transport failures, 429 and 5xx are worth another attempt; bad keys,
/// bad requests and unreadable replies are not.
fn is_retryable(err: &anyhow::Error) -> bool {
    if let Some(rejected) = err.downcast_ref::<ChatRejected>() {
        return rejected.status == StatusCode::TOO_MANY_REQUESTS
            || rejected.status.is_server_error();
    }
    err.downcast_ref::<reqwest::Error>()
        .is_some_and(|err| !err.is_decode() && !err.is_status())
}

/// Narrator backed by a hosted chat-completion API.
///
/// The call is fully async. A semaphore caps how many narrations run at
/// once, so a slow model queues requests instead of piling up connections.
pub struct ChatNarrator {
    http: Client,
    url: String,
    api_key: ApiKey,
    model_id: String,
    max_tokens: u32,
    dialect: Dialect,
    permits: Semaphore,
    retry: RetryPolicy,
}

impl ChatNarrator {
    pub fn new(config: &NarratorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("chaincompass/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build narration HTTP client")?;

        let dialect = config.dialect();

        Ok(Self {
            http,
            url: format!("{}{}", config.api_url, dialect.chat_endpoint()),
            api_key: config.api_key.clone(),
            model_id: config.model_id.clone(),
            max_tokens: config.max_tokens,
            dialect,
            permits: Semaphore::new(config.max_concurrent.max(1)),
            retry: RetryPolicy {
                max_attempts: config.attempts.max(1),
                ..RetryPolicy::default()
            },
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self
            .dialect
            .build_chat_body(&self.model_id, prompt, self.max_tokens);

        let mut request = self.http.post(&self.url).json(&body);
        for (name, value) in self.dialect.chat_headers(self.api_key.expose()) {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChatRejected { status, detail }.into());
        }

        let reply: Value = response
            .json()
            .await
            .context("Error parsing the chat completion response")?;
        trace!(%reply, "chat completion response");

        let content = self
            .dialect
            .parse_chat_content(&reply)
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .context("Chat completion response carried no content")?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl Narrator for ChatNarrator {
    async fn narrate(&self, summary: &QuoteSummary) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .context("Narration pool is closed")?;

        let prompt = build_route_prompt(summary);
        debug!(model = %self.model_id, "requesting narration");

        self.retry
            .run("narration", || self.complete(&prompt), is_retryable)
            .await
            .map_err(|failure| failure.error)
    }
}
