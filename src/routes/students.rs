use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    models::{
        student::{CreateStudentRequest, StudentQuery, UpdateStudentRequest},
        user::Principal,
    },
    routes::{to_json, ApiError},
    services::{
        audit::{self, AuditEntry},
        students::StudentService,
    },
    AppState,
};

pub async fn list_students(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<StudentQuery>,
) -> Result<Json<Value>, ApiError> {
    to_json(StudentService::list(state.store.as_ref(), &principal, &q).await?)
}

pub async fn get_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    to_json(StudentService::get(state.store.as_ref(), &principal, id).await?)
}

pub async fn create_student(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let student = StudentService::create(state.store.as_ref(), &principal, &body).await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "student.create", "student", student.id)
            .with_detail(student.full_name()),
    );
    Ok((StatusCode::CREATED, to_json(student)?))
}

pub async fn update_student(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStudentRequest>,
) -> Result<Json<Value>, ApiError> {
    let student = StudentService::update(state.store.as_ref(), &principal, id, &body).await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "student.update", "student", id),
    );
    to_json(student)
}
