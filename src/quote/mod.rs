pub mod cache;
pub mod request;
pub mod summary;

pub use cache::QuoteCache;
pub use request::{CacheKey, QuoteParams, SwapRequest};
pub use summary::{summarize, QuoteSummary};
