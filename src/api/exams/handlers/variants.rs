use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentTeacher, OptionalClaims};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::db::models::BaseExam;
use crate::repositories;
use crate::services::variants::{make_runtime_variant, RuntimeVariant};

use super::super::helpers;

pub(in crate::api::exams) async fn get_variant(
    Path(exam_id): Path<String>,
    claims: OptionalClaims,
    State(state): State<AppState>,
) -> Result<Json<RuntimeVariant>, ApiError> {
    let exam = helpers::load_base_exam(&state, &exam_id).await?;
    Ok(Json(serve_variant(&exam, &claims)))
}

pub(in crate::api::exams) async fn latest_variant(
    claims: OptionalClaims,
    State(state): State<AppState>,
) -> Result<Json<Option<RuntimeVariant>>, ApiError> {
    let exam = repositories::exams::find_latest(state.data_dir())
        .await
        .map_err(|e| ApiError::store(e, "Failed to load latest exam"))?;

    Ok(Json(exam.map(|exam| serve_variant(&exam, &claims))))
}

/// Variant snapshots recorded on the base exam, as stored.
pub(in crate::api::exams) async fn list_variants(
    Path(exam_id): Path<String>,
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let exam = helpers::load_base_exam(&state, &exam_id).await?;
    Ok(Json(exam.variants))
}

fn serve_variant(exam: &BaseExam, claims: &OptionalClaims) -> RuntimeVariant {
    let mut variant = make_runtime_variant(exam);
    metrics::record_runtime_variant(exam.shuffle_config.p1_mode);
    tracing::debug!(exam_id = %exam.id, variant_id = %variant.id, "Runtime variant generated");

    if !claims.is_teacher() {
        variant.redact_answers();
    }
    variant
}
