use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentTeacher, OptionalClaims};
use crate::core::security;
use crate::core::state::AppState;
use crate::db::models::BaseExam;
use crate::repositories;
use crate::schemas::exam::{CorrectAnswersUpdate, OkResponse, QuestionTextUpdate, VerifyPasswordRequest};
use crate::services::variants::is_variant_id;

use super::super::helpers;

/// The base exam behind an exam or variant id. Students get it without answers or password.
pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<String>,
    claims: OptionalClaims,
    State(state): State<AppState>,
) -> Result<Json<BaseExam>, ApiError> {
    let mut exam = helpers::load_base_exam(&state, &exam_id).await?;
    if !claims.is_teacher() {
        exam.redact_for_student();
    }
    Ok(Json(exam))
}

pub(in crate::api::exams) async fn verify_password(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam = helpers::load_base_exam(&state, &payload.exam_id).await?;
    let ok = match exam.password.as_deref().filter(|password| !password.is_empty()) {
        Some(expected) => security::passwords_match(payload.password.trim(), expected),
        None => true,
    };

    Ok(Json(OkResponse { ok }))
}

pub(in crate::api::exams) async fn update_question_text(
    Path((exam_id, question_id)): Path<(String, String)>,
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<QuestionTextUpdate>,
) -> Result<Json<OkResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let _guard = state.exams_lock().lock().await;
    let mut exam = helpers::load_base_exam(&state, &exam_id).await?;
    if !exam.update_question(&question_id, |question| question.question = text.to_string()) {
        return Err(ApiError::NotFound(format!("Question '{question_id}' not found")));
    }
    helpers::save_exam(&state, &exam).await?;

    tracing::info!(exam_id = %exam.id, question_id = %question_id, "Question text updated");
    Ok(Json(OkResponse::ok()))
}

/// Replaces the answer key and mirrors it into each question's typed `correctAnswer`.
pub(in crate::api::exams) async fn set_correct_answers(
    Path(exam_id): Path<String>,
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<CorrectAnswersUpdate>,
) -> Result<Json<OkResponse>, ApiError> {
    if is_variant_id(&exam_id) {
        return Err(ApiError::BadRequest(
            "Answers can only be set on a base exam, not a variant".to_string(),
        ));
    }

    let _guard = state.exams_lock().lock().await;
    let mut exam = helpers::load_base_exam(&state, &exam_id).await?;

    let question_ids: Vec<String> = exam.questions.iter().map(|question| question.id.clone()).collect();
    for question_id in &question_ids {
        match payload.answers.get(question_id) {
            Some(answer) => exam.update_question(question_id, |question| question.set_correct_answer(answer)),
            None => exam.update_question(question_id, |question| question.redact_answer()),
        };
    }

    let unknown = payload.answers.keys().filter(|id| !question_ids.contains(id)).count();
    if unknown > 0 {
        tracing::warn!(exam_id = %exam.id, unknown, "Answer key names unknown questions");
    }

    exam.answers = payload.answers;
    helpers::save_exam(&state, &exam).await?;

    tracing::info!(exam_id = %exam.id, answers = exam.answers.len(), "Answer key updated");
    Ok(Json(OkResponse::ok()))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<OkResponse>, ApiError> {
    let _guard = state.exams_lock().lock().await;
    let deleted = repositories::exams::delete_by_id(state.data_dir(), &exam_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to delete exam"))?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Exam '{exam_id}' not found")));
    }

    tracing::info!(exam_id = %exam_id, "Exam deleted");
    Ok(Json(OkResponse::ok()))
}
