use super::auth::verify_password;
use super::error::ApiError;
use super::state::AppState;
use super::store::local_day_bounds;
use crate::visitor::validation::validate_visitor;
use crate::visitor::{NewVisitor, SearchKey, VisitorRecord};
use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let stored = state.store()?.password_hash(&payload.username)?;
    let accepted = stored.is_some_and(|hash| verify_password(&payload.password, &hash));
    state.metrics.record_login(accepted);
    if !accepted {
        tracing::warn!(username = %payload.username, "Login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(&payload.username)?;
    tracing::info!(username = %payload.username, "Login accepted");
    Ok(Json(json!({ "token": token })))
}

pub async fn create_visitor_handler(
    State(state): State<Arc<AppState>>,
    Json(visitor): Json<NewVisitor>,
) -> Result<impl IntoResponse, ApiError> {
    validate_visitor(&visitor).map_err(ApiError::Validation)?;
    let record = state.store()?.insert(&visitor)?;
    state.metrics.record_registration();
    tracing::info!(pass_code = %record.pass_code(), destination = %record.destination, "Visitor registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "passCode": record.pass_code() })),
    ))
}

pub async fn list_visitors_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VisitorRecord>>, ApiError> {
    Ok(Json(state.store()?.all()?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    mobile: Option<String>,
    identity_number: Option<String>,
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<VisitorRecord>, ApiError> {
    let key = match (params.mobile, params.identity_number) {
        (Some(mobile), _) => SearchKey::mobile(&mobile)?,
        (None, Some(id)) => SearchKey::identity_number(&id)?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Provide either mobile or identityNumber".into(),
            ))
        }
    };

    let found = state.store()?.find_latest(&key)?;
    state.metrics.record_search(found.is_some());
    tracing::debug!(field = key.field(), found = found.is_some(), "Visitor search");
    found.map(Json).ok_or(ApiError::NotFound)
}

#[derive(Deserialize)]
pub struct ByDateParams {
    date: String,
}

pub async fn by_date_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByDateParams>,
) -> Result<Json<Vec<VisitorRecord>>, ApiError> {
    let date = NaiveDate::parse_from_str(&params.date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date {:?}, expected YYYY-MM-DD", params.date)))?;
    let (start, end) = local_day_bounds(date, state.offset)
        .ok_or_else(|| ApiError::BadRequest(format!("Date {date} is out of range")))?;
    let records = state.store()?.between(start, end)?;
    state.metrics.record_register_query(records.len());
    tracing::debug!(%date, count = records.len(), "Daily register query");
    Ok(Json(records))
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(output) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
