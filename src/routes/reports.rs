use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    models::{fee::ClassDuesQuery, user::Principal},
    routes::{to_json, ApiError},
    services::reports::ReportService,
    AppState,
};

fn csv_response(filename: String, body: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

pub async fn dashboard(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, ApiError> {
    let summary = ReportService::dashboard(
        state.store.as_ref(),
        &principal,
        Utc::now().date_naive(),
        state.config.count_late_as_present,
    )
    .await?;
    to_json(summary)
}

pub async fn class_dues_csv(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<ClassDuesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let body =
        ReportService::class_dues_csv(state.store.as_ref(), &principal, &q.class, &q.section)
            .await?;
    Ok(csv_response(format!("dues-{}-{}.csv", q.class, q.section), body))
}

pub async fn exam_results_csv(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let body = ReportService::exam_results_csv(state.store.as_ref(), &principal, id).await?;
    Ok(csv_response(format!("exam-{id}-results.csv"), body))
}
