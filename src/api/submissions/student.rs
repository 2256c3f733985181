use axum::{extract::State, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::OptionalClaims;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{now_rfc3339, now_unix_millis};
use crate::db::models::ResultRecord;
use crate::db::types::SubmissionStatus;
use crate::db::StoreError;
use crate::repositories;
use crate::schemas::submission::{SubmissionCreate, SubmissionResponse};
use crate::services::scoring::calculate_score;
use crate::services::variants::base_exam_id;

const UNKNOWN_CLASS: &str = "unknown";

/// Grades against the base exam's answer key and stores the result under the student's class.
///
/// A student token's class wins over the class named in the payload. Submissions for
/// unknown exams are still recorded, ungraded.
pub(super) async fn submit_exam(
    claims: OptionalClaims,
    State(state): State<AppState>,
    Json(payload): Json<SubmissionCreate>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let class_name = claims
        .class_name()
        .map(str::to_string)
        .or_else(|| non_blank(payload.class_name.as_deref()))
        .unwrap_or_else(|| UNKNOWN_CLASS.to_string());

    let exam_id = non_blank(payload.exam_id.as_deref());
    let score = match exam_id.as_deref() {
        Some(exam_id) => grade(&state, exam_id, &payload.answers).await?,
        None => None,
    };

    let name = non_blank(payload.name.as_deref());
    let student_id = non_blank(payload.id.as_deref())
        .or_else(|| name.clone())
        .unwrap_or_else(|| format!("stu_{}", now_unix_millis()));

    let record = ResultRecord {
        id: student_id,
        name: name.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        dob: payload.dob.unwrap_or_default(),
        exam_id,
        score,
        violations: payload.violations,
        submitted_at: now_rfc3339(),
        status: SubmissionStatus::Submitted,
        answers: payload.answers,
    };
    let student_id = record.id.clone();

    {
        let _guard = state.results_lock().lock().await;
        repositories::results::upsert_for_class(state.data_dir(), &class_name, record)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store submission"))?;
    }

    metrics::record_submission_graded(score.is_some());
    tracing::info!(
        class_name = %class_name,
        student_id = %student_id,
        score = ?score,
        "Submission stored"
    );

    Ok(Json(SubmissionResponse { ok: true, score }))
}

async fn grade(
    state: &AppState,
    exam_id: &str,
    answers: &serde_json::Value,
) -> Result<Option<f64>, ApiError> {
    let base_id = base_exam_id(exam_id);
    let exam = match repositories::exams::find_by_id(state.data_dir(), base_id).await {
        Ok(exam) => exam,
        Err(StoreError::InvalidId(_)) => None,
        Err(err) => return Err(ApiError::internal(err, "Failed to load exam")),
    };

    let Some(exam) = exam else {
        tracing::warn!(exam_id = %exam_id, "Submission for unknown exam; storing ungraded");
        return Ok(None);
    };

    Ok(calculate_score(answers, &exam.answers, &exam.questions))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
