pub mod args;
pub mod config;
pub mod error;
pub mod logging;
pub mod narration;
pub mod quote;
pub mod retry;
pub mod server;
pub mod service;
pub mod upstream;

#[cfg(test)]
mod test_support;

use crate::config::AppConfig;
use crate::narration::{ChatNarrator, Narrator};
use crate::quote::QuoteCache;
use crate::server::ServiceSlot;
use crate::service::QuoteService;
use crate::upstream::{LifiClient, QuoteSource};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub use args::Cli;

/// A configured, not yet serving, ChainCompass instance.
pub struct Application {
    config: AppConfig,
    slot: ServiceSlot,
}

impl Application {
    /// Build every shared collaborator and install the pipeline.
    pub fn init(config: AppConfig) -> Result<Application> {
        let source: Arc<dyn QuoteSource> = Arc::new(
            LifiClient::new(&config.aggregator).context("Failed to set up aggregator client")?,
        );
        let narrator: Arc<dyn Narrator> = Arc::new(
            ChatNarrator::new(&config.narrator).context("Failed to set up narrator")?,
        );
        let cache = Arc::new(QuoteCache::new(config.cache.capacity, config.cache.ttl));

        let service = QuoteService::new(source, cache, narrator, config.retry);

        let slot = ServiceSlot::empty();
        slot.install(Arc::new(service));

        Ok(Application { config, slot })
    }

    pub async fn run(self) -> Result<()> {
        let app = server::router(self.slot.clone(), &self.config.server.allowed_origins)?;
        server::serve(&self.config.server, app, self.slot.clone()).await?;

        // Normally already emptied by the signal handler; this drops the pooled clients.
        drop(self.slot.take());
        info!("ChainCompass stopped");
        Ok(())
    }
}
