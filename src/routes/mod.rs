pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod exams;
pub mod fees;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod students;

use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{middleware::auth::JwtSecret, AppState};

/// Error half of every handler result: a status and an `{ "error": ... }` body.
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn to_json<T: Serialize>(value: T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(value).map(Json).map_err(|e| {
        tracing::error!("response serialization failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Something went wrong, please try again" })),
        )
    })
}

/// Every API route, with the JWT secret extension the auth extractors read.
/// Transport layers (tracing, CORS) are added by the binary.
pub fn app(state: AppState) -> Router {
    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/access/scope", get(assignments::scope))
        // Class assignments (admin)
        .route(
            "/users/{id}/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route("/assignments/{id}", delete(assignments::delete_assignment))
        // Students
        .route("/students", get(students::list_students).post(students::create_student))
        .route("/students/{id}", get(students::get_student).put(students::update_student))
        .route("/students/{id}/fees", get(fees::list_outstanding))
        .route("/students/{id}/payments", get(fees::payment_history))
        .route("/students/{id}/attendance", get(attendance::student_range))
        // Subjects & exams
        .route("/subjects", get(exams::list_subjects).post(exams::create_subject))
        .route("/exams", get(exams::list_exams).post(exams::create_exam))
        .route("/exams/{id}", get(exams::get_exam))
        .route("/exams/{id}/status", put(exams::update_status))
        .route("/exams/{id}/subjects", post(exams::add_subject))
        .route("/exams/{id}/marks", get(exams::list_marks).put(exams::save_marks))
        .route("/exams/{id}/results", get(exams::results))
        // Fees
        .route("/fees", post(fees::create_dues))
        .route("/fees/class-dues", get(fees::class_dues))
        .route("/fees/stats", get(fees::stats))
        .route("/fees/{id}/payments", post(fees::record_payment))
        .route("/fees/{id}/ledger", get(fees::verify_ledger))
        // Attendance
        .route("/attendance", post(attendance::mark))
        .route("/attendance/register", get(attendance::register))
        .route("/attendance/daily", get(attendance::daily))
        // Reports
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/class-dues.csv", get(reports::class_dues_csv))
        .route("/reports/exams/{id}/results.csv", get(reports::exam_results_csv))
        .layer(axum::Extension(jwt_secret))
        .with_state(state)
}
