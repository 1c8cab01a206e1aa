use super::QuoteSource;
use crate::config::AggregatorConfig;
use crate::error::UpstreamError;
use crate::quote::request::SwapRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

/// Longest slice of a rejection body echoed back to the caller.
const MAX_ECHOED_BODY: usize = 2048;

/// LI.FI quote client.
///
/// Holds one pooled `reqwest::Client` for the process lifetime. In-flight
/// requests are capped by a semaphore sized like the pool.
pub struct LifiClient {
    http: Client,
    quote_url: String,
    permits: Semaphore,
}

impl LifiClient {
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(config.api_key.expose())
            .context("LI.FI API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-lifi-api-key"), key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .user_agent(concat!("chaincompass/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build aggregator HTTP client")?;

        Ok(Self {
            http,
            quote_url: config.quote_url(),
            permits: Semaphore::new(config.max_connections.max(1)),
        })
    }
}

#[async_trait]
impl QuoteSource for LifiClient {
    async fn fetch_quote(&self, request: &SwapRequest) -> Result<Value, UpstreamError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| UpstreamError::Transient("aggregator client is shutting down".into()))?;

        debug!(url = %self.quote_url, "requesting quote");
        let response = self
            .http
            .get(&self.quote_url)
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(transient)?;

        let status = response.status();
        let body = response.text().await.map_err(transient)?;
        trace!(%status, bytes = body.len(), "aggregator responded");

        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body: truncate(body, MAX_ECHOED_BODY),
            });
        }

        serde_json::from_str(&body).map_err(|err| UpstreamError::Malformed(err.to_string()))
    }
}

/// Everything reqwest reports before a full body arrives is network-level.
fn transient(err: reqwest::Error) -> UpstreamError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "transport"
    };
    UpstreamError::Transient(format!("{kind}: {err}"))
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
