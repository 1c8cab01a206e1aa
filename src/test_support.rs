//! Fakes and stub servers shared by the unit tests.

use crate::error::UpstreamError;
use crate::narration::Narrator;
use crate::quote::request::SwapRequest;
use crate::quote::summary::QuoteSummary;
use crate::upstream::QuoteSource;
use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// The aggregator response used throughout the tests.
pub(crate) fn sample_quote() -> Value {
    json!({
        "estimate": {
            "executionDuration": 48,
            "toAmountUSD": "99.0625",
            "feeCosts": [
                {"amountUSD": "0.25"},
                {"amountUSD": "0.0098"},
                {"amountUSD": "0.0116"},
                {"amountUSD": "0.0048"}
            ]
        },
        "toolDetails": {"name": "AcrossV4"}
    })
}

/// Quote source that replays scripted outcomes and counts calls.
///
/// Once the script is exhausted the last outcome repeats.
pub(crate) struct FakeSource {
    script: Mutex<VecDeque<Result<Value, UpstreamError>>>,
    last: Mutex<Option<Result<Value, UpstreamError>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<SwapRequest>>,
}

impl FakeSource {
    pub(crate) fn new(script: impl IntoIterator<Item = Result<Value, UpstreamError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(outcome: Result<Value, UpstreamError>) -> Self {
        Self::new([outcome])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<SwapRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteSource for FakeSource {
    async fn fetch_quote(&self, request: &SwapRequest) -> Result<Value, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(UpstreamError::Transient("empty script".into())))
    }
}

/// Narrator that records every summary it is asked to narrate.
#[derive(Default)]
pub(crate) struct RecordingNarrator {
    seen: Mutex<Vec<QuoteSummary>>,
    fail: bool,
    reply: Option<String>,
}

impl RecordingNarrator {
    /// Answer every narration with `reply` verbatim.
    pub(crate) fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn seen(&self) -> Vec<QuoteSummary> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Narrator for RecordingNarrator {
    async fn narrate(&self, summary: &QuoteSummary) -> anyhow::Result<String> {
        self.seen.lock().unwrap().push(summary.clone());
        if self.fail {
            anyhow::bail!("model unavailable");
        }
        if let Some(reply) = &self.reply {
            return Ok(reply.clone());
        }
        Ok(format!(
            "Route via {} takes {}s.",
            summary.provider, summary.time_seconds
        ))
    }
}
