//! One-sentence narration of a route summary.

mod chat;
mod dialect;
pub mod prompt;

pub use chat::ChatNarrator;
pub use dialect::{Anthropic, ChatDialect, Dialect, OpenAi};

use crate::quote::summary::QuoteSummary;
use async_trait::async_trait;

/// Turns a [`QuoteSummary`] into a single natural-language sentence.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, summary: &QuoteSummary) -> anyhow::Result<String>;
}
