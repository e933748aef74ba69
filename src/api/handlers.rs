use crate::api::AppState;
use crate::error::Result;
use crate::models::{PatientCase, PatientRecord, Priority, Substitution};
use crate::processing::PriorityMessage;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        encoding_policy: state.processor.policy().to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub encoding_policy: String,
}

/// Predict a priority for one submission. The case is not queued.
pub async fn predict(
    State(state): State<AppState>,
    Json(record): Json<PatientRecord>,
) -> Result<Json<PredictResponse>> {
    record.validate()?;

    let assessment = state.processor.assess(&record)?;

    Ok(Json(PredictResponse {
        priority_level: assessment.priority,
    }))
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub priority_level: Priority,
}

/// Predict a priority and append the case to the triage queue
pub async fn submit_case(
    State(state): State<AppState>,
    Json(record): Json<PatientRecord>,
) -> Result<(StatusCode, Json<TriageResponse>)> {
    record.validate()?;

    let (assessment, case) = state.processor.submit(record)?;

    Ok((
        StatusCode::CREATED,
        Json(TriageResponse {
            priority_level: assessment.priority,
            message: assessment.message,
            substitutions: assessment.substitutions,
            case,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct TriageResponse {
    pub case: PatientCase,
    pub priority_level: Priority,
    pub message: PriorityMessage,
    pub substitutions: Vec<Substitution>,
}

/// Queue view, most urgent first
pub async fn list_queue(State(state): State<AppState>) -> Result<Json<QueueResponse>> {
    let cases = state.processor.queue().view_sorted();

    Ok(Json(QueueResponse {
        total: cases.len(),
        cases,
    }))
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub cases: Vec<PatientCase>,
    pub total: usize,
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
