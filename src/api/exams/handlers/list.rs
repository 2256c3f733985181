use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentTeacher, OptionalClaims};
use crate::core::state::AppState;
use crate::db::models::BaseExam;
use crate::repositories;
use crate::schemas::exam::ExamSummary;

pub(in crate::api::exams) async fn list_exams(
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSummary>>, ApiError> {
    let exams = repositories::exams::list_all(state.data_dir())
        .await
        .map_err(|e| ApiError::store(e, "Failed to list exams"))?;

    Ok(Json(exams.iter().map(ExamSummary::from).collect()))
}

/// The newest base exam, or `null` when nothing was uploaded yet.
pub(in crate::api::exams) async fn latest_exam(
    claims: OptionalClaims,
    State(state): State<AppState>,
) -> Result<Json<Option<BaseExam>>, ApiError> {
    let mut exam = repositories::exams::find_latest(state.data_dir())
        .await
        .map_err(|e| ApiError::store(e, "Failed to load latest exam"))?;

    if !claims.is_teacher() {
        if let Some(exam) = exam.as_mut() {
            exam.redact_for_student();
        }
    }

    Ok(Json(exam))
}
