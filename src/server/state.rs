use crate::service::QuoteService;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the quote pipeline.
///
/// Empty until startup has built every collaborator, and emptied again when
/// shutdown begins; handlers answer 503 while it is empty.
#[derive(Clone, Default)]
pub struct ServiceSlot {
    inner: Arc<RwLock<Option<Arc<QuoteService>>>>,
}

impl ServiceSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn install(&self, service: Arc<QuoteService>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(service);
    }

    /// Empty the slot, handing back the service so the caller controls when it drops.
    pub fn take(&self) -> Option<Arc<QuoteService>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn get(&self) -> Option<Arc<QuoteService>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.get().is_some()
    }
}
