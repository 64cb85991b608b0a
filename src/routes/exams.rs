use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam::{
            ClassSectionQuery, CreateExamRequest, CreateSubjectRequest, ExamSubjectSpec,
            SaveMarksRequest, UpdateExamStatusRequest,
        },
        user::Principal,
    },
    routes::{to_json, ApiError},
    services::{
        audit::{self, AuditEntry},
        exams::ExamService,
        grades::GradeService,
    },
    AppState,
};

pub async fn list_subjects(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<ClassSectionQuery>,
) -> Result<Json<Value>, ApiError> {
    let (Some(class), Some(section)) = (q.class.as_deref(), q.section.as_deref()) else {
        return Err(AppError::validation("class", "Select class and section first").into());
    };
    to_json(ExamService::list_subjects(state.store.as_ref(), &principal, class, section).await?)
}

pub async fn create_subject(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subject = ExamService::create_subject(state.store.as_ref(), &principal, &body).await?;
    Ok((StatusCode::CREATED, to_json(subject)?))
}

pub async fn list_exams(
    State(state): State<AppState>,
    principal: Principal,
    Query(q): Query<ClassSectionQuery>,
) -> Result<Json<Value>, ApiError> {
    let exams = ExamService::list(
        state.store.as_ref(),
        &principal,
        q.class.as_deref(),
        q.section.as_deref(),
    )
    .await?;
    to_json(exams)
}

pub async fn create_exam(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<CreateExamRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = ExamService::create(state.store.as_ref(), &principal, &body).await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "exam.create", "exam", created.exam.id)
            .with_detail(created.exam.name.clone()),
    );
    Ok((StatusCode::CREATED, to_json(created)?))
}

pub async fn get_exam(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    to_json(ExamService::get(state.store.as_ref(), &principal, id).await?)
}

pub async fn update_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateExamStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    to_json(ExamService::update_status(state.store.as_ref(), &principal, id, body.status).await?)
}

pub async fn add_subject(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<ExamSubjectSpec>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let subject = ExamService::add_subject(state.store.as_ref(), &principal, id, &body).await?;
    Ok((StatusCode::CREATED, to_json(subject)?))
}

/// Marks as a `student_id -> exam_subject_id -> mark` grid.
pub async fn list_marks(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let grades = GradeService::list_marks(state.store.as_ref(), &principal, id).await?;
    to_json(GradeService::grid(&grades))
}

pub async fn save_marks(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<SaveMarksRequest>,
) -> Result<Json<Value>, ApiError> {
    let saved = GradeService::save_marks(state.store.as_ref(), &principal, id, &body.entries).await?;
    audit::log(
        state.store.clone(),
        AuditEntry::new(principal.user_id, "grades.save", "exam", id)
            .with_detail(format!("{} marks", saved.len())),
    );
    Ok(Json(json!({ "saved": saved.len() })))
}

pub async fn results(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let (exam, results) = GradeService::exam_results(state.store.as_ref(), &principal, id).await?;
    Ok(Json(json!({ "exam": exam, "results": results })))
}
