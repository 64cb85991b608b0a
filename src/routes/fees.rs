use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    models::{
        fee::{ClassDuesQuery, CreateDueRequest, RecordPaymentRequest},
        user::Principal,
    },
    routes::{to_json, ApiError},
    services::{
        audit::{self, AuditEntry},
        fees::FeeService,
    },
    AppState,
};

pub async fn create_dues(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<CreateDueRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let dues = FeeService::create_due(state.store.as_ref(), &principal, &body).await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "fee.create", "fee", &body.fee_type)
            .with_detail(format!("{} dues of {}", dues.len(), body.amount)),
    );
    Ok((StatusCode::CREATED, to_json(dues)?))
}

pub async fn list_outstanding(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    to_json(FeeService::list_outstanding(state.store.as_ref(), &principal, student_id).await?)
}

pub async fn payment_history(
    State(state): State<AppState>,
    principal: Principal,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    to_json(FeeService::payment_history(state.store.as_ref(), &principal, student_id).await?)
}

pub async fn record_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(fee_id): Path<Uuid>,
    Json(body): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let today = Utc::now().date_naive();
    let payment =
        FeeService::record_payment(state.store.as_ref(), &principal, fee_id, body.amount, today)
            .await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "fee.payment", "fee", fee_id)
            .with_detail(format!("paid {}", payment.amount)),
    );
    Ok((StatusCode::CREATED, to_json(payment)?))
}

pub async fn class_dues(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<ClassDuesQuery>,
) -> Result<Json<Value>, ApiError> {
    let totals =
        FeeService::due_totals_by_class(state.store.as_ref(), &principal, &q.class, &q.section)
            .await?;
    to_json(totals)
}

pub async fn stats(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, ApiError> {
    to_json(FeeService::collection_summary(state.store.as_ref(), &principal).await?)
}

pub async fn verify_ledger(
    State(state): State<AppState>,
    principal: Principal,
    Path(fee_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let check = FeeService::verify_ledger(state.store.as_ref(), &principal, fee_id).await?;
    if check.balanced {
        to_json(check)
    } else {
        Ok(Json(json!({ "check": check, "warning": "ledger out of balance" })))
    }
}
