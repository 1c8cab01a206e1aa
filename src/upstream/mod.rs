//! Route aggregator access.

mod lifi;

pub use lifi::LifiClient;

use crate::error::UpstreamError;
use crate::quote::request::SwapRequest;
use async_trait::async_trait;
use serde_json::Value;

/// Something that can price a swap.
///
/// One call is one attempt; retrying is the caller's decision.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, request: &SwapRequest) -> Result<Value, UpstreamError>;
}
