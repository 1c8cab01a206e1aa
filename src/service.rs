//! The quote pipeline: validate, look up or fetch, summarise, narrate.

use crate::error::{QuoteError, UpstreamError};
use crate::narration::Narrator;
use crate::quote::cache::QuoteCache;
use crate::quote::request::{QuoteParams, SwapRequest};
use crate::quote::summary::{summarize, QuoteSummary};
use crate::retry::RetryPolicy;
use crate::upstream::QuoteSource;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Response body of a successful quote request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarratedQuote {
    pub summary: String,
    pub provider: String,
    pub time_seconds: u64,
    pub fees_usd: f64,
    pub output_usd: f64,
}

impl NarratedQuote {
    fn new(summary: String, numbers: QuoteSummary) -> Self {
        Self {
            summary,
            provider: numbers.provider,
            time_seconds: numbers.time_seconds,
            fees_usd: numbers.fees_usd,
            output_usd: numbers.output_usd,
        }
    }
}

/// Runs one quote request through every pipeline stage, in order.
///
/// All collaborators are injected so tests can substitute fakes.
pub struct QuoteService {
    source: Arc<dyn QuoteSource>,
    cache: Arc<QuoteCache>,
    narrator: Arc<dyn Narrator>,
    retry: RetryPolicy,
}

impl QuoteService {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        cache: Arc<QuoteCache>,
        narrator: Arc<dyn Narrator>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            cache,
            narrator,
            retry,
        }
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub async fn quote(&self, params: QuoteParams) -> Result<NarratedQuote, QuoteError> {
        let request = SwapRequest::try_from(params)?;
        debug!(
            from = %format_args!("{}/{}", request.from_chain(), request.from_token()),
            to = %format_args!("{}/{}", request.to_chain(), request.to_token()),
            amount = request.from_amount(),
            "validated quote request"
        );

        let quote = self.raw_quote(&request).await?;

        let numbers = summarize(&quote);
        debug!(?numbers, "summarised quote");

        let sentence = self
            .narrator
            .narrate(&numbers)
            .await
            .map_err(QuoteError::Narration)?;

        info!(provider = %numbers.provider, "quote served");
        Ok(NarratedQuote::new(sentence, numbers))
    }

    async fn raw_quote(&self, request: &SwapRequest) -> Result<Arc<Value>, QuoteError> {
        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("quote cache hit");
            return Ok(cached);
        }

        debug!("quote cache miss, fetching");
        let quote = self
            .retry
            .run(
                "aggregator request",
                || self.source.fetch_quote(request),
                UpstreamError::is_transient,
            )
            .await
            .map_err(|failure| {
                warn!(error = %failure.error, attempts = failure.attempts, "aggregator request failed");
                QuoteError::from_upstream(failure.error, failure.attempts)
            })?;

        let quote = Arc::new(quote);
        self.cache.put(key, Arc::clone(&quote));
        Ok(quote)
    }
}
