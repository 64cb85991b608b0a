use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    models::user::{CreateAssignmentRequest, Principal},
    routes::{to_json, ApiError},
    services::{
        access::{available_classes, available_sections, AccessService},
        audit::{self, AuditEntry},
    },
    AppState,
};

#[derive(Deserialize)]
pub struct ScopeQuery {
    pub class: Option<String>,
}

/// Classes the caller may pick, and the sections for `class` when given.
pub async fn scope(
    principal: Principal,
    Query(q): Query<ScopeQuery>,
) -> Json<Value> {
    Json(json!({
        "classes": available_classes(&principal),
        "sections": available_sections(&principal, q.class.as_deref()),
    }))
}

pub async fn list_assignments(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let assignments =
        AccessService::list_assignments(state.store.as_ref(), &principal, user_id).await?;
    to_json(assignments)
}

pub async fn create_assignment(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(body): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let assignment = AccessService::assign(state.store.as_ref(), &principal, user_id, &body).await?;

    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "assignment.create", "class_assignment", assignment.id)
            .with_detail(format!("user {user_id} -> {}-{}", body.class, body.section)),
    );

    Ok((StatusCode::CREATED, to_json(assignment)?))
}

pub async fn delete_assignment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    AccessService::unassign(state.store.as_ref(), &principal, id).await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "assignment.delete", "class_assignment", id),
    );
    Ok(StatusCode::NO_CONTENT)
}
