//! HTTP request handlers.

use super::state::ServiceSlot;
use crate::error::QuoteError;
use crate::quote::request::QuoteParams;
use crate::service::NarratedQuote;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use tracing::{info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
pub struct Welcome {
    message: &'static str,
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

/// GET / - Confirm the server is up.
pub async fn root() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the ChainCompass API!",
    })
}

/// GET /health - Liveness, independent of the pipeline's readiness.
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// GET /api/v1/quote - Best route for a swap, with a one-sentence summary.
pub async fn quote(
    State(slot): State<ServiceSlot>,
    query: Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<NarratedQuote>, QuoteError> {
    // Duplicate keys and broken percent-encoding still answer with the JSON error shape.
    let Query(params) = query.map_err(|rejection| {
        QuoteError::validation("query", rejection.body_text())
    })?;
    let service = slot.get().ok_or(QuoteError::NotReady)?;

    let span = info_span!(
        "quote",
        request_id = %Uuid::new_v4(),
        from_chain = params.from_chain.as_deref().unwrap_or_default(),
        to_chain = params.to_chain.as_deref().unwrap_or_default(),
        from_token = params.from_token.as_deref().unwrap_or_default(),
        to_token = params.to_token.as_deref().unwrap_or_default(),
    );

    service.quote(params).instrument(span).await.map(Json)
}
