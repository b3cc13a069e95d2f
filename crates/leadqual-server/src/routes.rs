//! Request handlers

use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use leadqual_core::agents::{RouterEvent, RouterReply};
use leadqual_core::{MetricsSnapshot, PipelineOutcome, QualificationResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub message: String,
}

/// `POST /query`: run the qualification pipeline
pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QualificationResult>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("invalid JSON payload"))?;
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("query field cannot be empty"));
    }

    tracing::info!("Qualifying lead for query {:?}", query);
    match state
        .orchestrator
        .run_with_deadline(query, state.request_timeout)
        .await?
    {
        PipelineOutcome::Qualified(result) => Ok(Json(result)),
        PipelineOutcome::NoRelevantLead => Err(ApiError::not_found("no relevant lead found")),
    }
}

/// Aborts the router turn when the response stream is dropped
struct TurnGuard(JoinHandle<leadqual_core::Result<RouterReply>>);

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// `POST /agent`: one router turn as a server-sent event stream.
///
/// Emits `handoff` and `delta` events while the turn runs, then a single
/// `done` (the final reply) or `error` event.
pub async fn agent_handler(
    State(state): State<AppState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::bad_request("invalid JSON payload"))?;
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::bad_request("message field cannot be empty"));
    }

    let (rx, handle) = state
        .router
        .stream_with_deadline(message, state.request_timeout);
    let guard = TurnGuard(handle);

    let events = ReceiverStream::new(rx).map(|event| Ok(router_event(event)));
    let finished = stream::once(async move {
        let mut guard = guard;
        let event = match (&mut guard.0).await {
            Ok(Ok(reply)) => json_event("done", &reply),
            Ok(Err(e)) => {
                tracing::warn!("Router turn failed: {}", e);
                json_event("error", &json!({ "error": e.to_string() }))
            }
            Err(e) => json_event("error", &json!({ "error": e.to_string() })),
        };
        Ok(event)
    });

    Ok(Sse::new(events.chain(finished)).keep_alive(KeepAlive::default()))
}

fn router_event(event: RouterEvent) -> Event {
    match event {
        RouterEvent::Handoff(handoff) => json_event("handoff", &handoff),
        RouterEvent::Delta(text) => Event::default().event("delta").data(text),
    }
}

fn json_event<T: Serialize>(name: &str, value: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(value)
        .unwrap_or_else(|_| Event::default().event(name))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsSnapshot>,
}

/// `GET /health`: store reachability and client counters.
///
/// 503 when the store cannot be read.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let metrics = state.metrics.as_ref().map(|client| client.metrics());
    match state.store.count().await {
        Ok(documents) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                documents: Some(documents),
                error: None,
                metrics,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded".to_string(),
                documents: None,
                error: Some(e.to_string()),
                metrics,
            }),
        ),
    }
}
