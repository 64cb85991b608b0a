use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::user::{LoginRequest, Principal, UserProfile},
    routes::{to_json, ApiError},
    services::{
        access::{available_classes, available_sections},
        auth::AuthService,
    },
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let response = AuthService::login(
        state.store.as_ref(),
        &body.email,
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )
    .await
    .map_err(|e| (StatusCode::UNAUTHORIZED, Json(json!({ "error": e.to_string() }))))?;
    to_json(response)
}

/// The caller's profile with the class-sections it can act on.
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .get_user(principal.user_id)
        .await
        .map_err(AppError::from)?
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))))?;

    Ok(Json(json!({
        "user": UserProfile::from(user),
        "assignments": principal.assignments,
        "classes": available_classes(&principal),
        "sections": available_sections(&principal, None),
    })))
}
