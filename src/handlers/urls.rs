use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    error::AppError,
    models::{AccessCount, AppState, Record, UrlRequest, WireRecord},
    service::Shortened,
};

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    debug!(status = status.as_u16(), body = %String::from_utf8_lossy(&body), "response");
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}

fn record_response(
    status: StatusCode,
    record: &Record,
    access_count: AccessCount,
) -> Result<Response, AppError> {
    Ok(json_response(status, record.to_wire_bytes(access_count)?))
}

pub async fn create_url_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = UrlRequest::from_wire_bytes(&body)?;

    match app_state.service.shorten(request).await? {
        Shortened::Created(record) => {
            record_response(StatusCode::CREATED, &record, AccessCount::Hidden)
        }
        Shortened::Existing(record) => {
            record_response(StatusCode::OK, &record, AccessCount::Hidden)
        }
    }
}

pub async fn get_url_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let record = app_state.service.fetch(&code).await?;
    record_response(StatusCode::OK, &record, AccessCount::Hidden)
}

pub async fn url_stats_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let record = app_state.service.stats(&code).await?;
    record_response(StatusCode::OK, &record, AccessCount::Shown)
}

pub async fn list_urls_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let records = app_state.service.list().await?;
    let views: Vec<WireRecord<'_>> = records
        .iter()
        .map(|record| record.wire(AccessCount::Hidden))
        .collect();

    Ok(json_response(StatusCode::OK, serde_json::to_vec(&views)?))
}

pub async fn update_url_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = UrlRequest::from_wire_bytes(&body)?;
    let record = app_state.service.replace(&code, request).await?;
    record_response(StatusCode::OK, &record, AccessCount::Hidden)
}

pub async fn delete_url_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    app_state.service.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn fallback_handler(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
