use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    models::{
        attendance::{MarkAttendanceRequest, RangeQuery, RegisterQuery},
        user::Principal,
    },
    routes::{to_json, ApiError},
    services::{
        attendance::AttendanceService,
        audit::{self, AuditEntry},
    },
    AppState,
};

#[derive(Deserialize)]
pub struct DailyQuery {
    pub date: Option<NaiveDate>,
    pub count_late_as_present: Option<bool>,
}

pub async fn mark(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<MarkAttendanceRequest>,
) -> Result<Json<Value>, ApiError> {
    let stored = AttendanceService::mark(state.store.as_ref(), &principal, &body.records).await?;
    if let Some(first) = stored.first() {
        audit::log(
            state.store.clone(),
            AuditEntry::new(principal.user_id, "attendance.mark", "attendance", first.date)
                .with_detail(format!("{} rows", stored.len())),
        );
    }
    Ok(Json(json!({ "saved": stored.len() })))
}

pub async fn register(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<RegisterQuery>,
) -> Result<Json<Value>, ApiError> {
    let rows = AttendanceService::class_register(
        state.store.as_ref(),
        &principal,
        &q.class,
        &q.section,
        q.date,
    )
    .await?;
    to_json(rows)
}

pub async fn student_range(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<Uuid>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Value>, ApiError> {
    let summary = AttendanceService::by_student_range(
        state.store.as_ref(),
        &principal,
        student_id,
        q.start,
        q.end,
        q.count_late_as_present
            .unwrap_or(state.config.count_late_as_present),
    )
    .await?;
    to_json(summary)
}

pub async fn daily(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<DailyQuery>,
) -> Result<Json<Value>, ApiError> {
    let day = AttendanceService::daily_breakdown(
        state.store.as_ref(),
        &principal,
        q.date.unwrap_or_else(|| Utc::now().date_naive()),
        q.count_late_as_present
            .unwrap_or(state.config.count_late_as_present),
    )
    .await?;
    to_json(day)
}
