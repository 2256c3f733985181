use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::BaseExam;
use crate::db::types::{OrderMode, ShuffleMode};

/// Upload of already-extracted exam text.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamUpload {
    #[serde(default, alias = "original_name")]
    #[validate(length(max = 255, message = "originalName is too long"))]
    pub(crate) original_name: String,
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub(crate) options: ExamUploadOptions,
}

/// Exam settings shared by the JSON and multipart upload forms.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamUploadOptions {
    #[serde(default, alias = "time_minutes")]
    #[validate(range(min = 1, max = 600, message = "timeMinutes must be between 1 and 600"))]
    pub(crate) time_minutes: Option<u32>,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[serde(default, alias = "p1_mode")]
    pub(crate) p1_mode: ShuffleMode,
    #[serde(default, alias = "p2_mode")]
    pub(crate) p2_mode: ShuffleMode,
    #[serde(default, alias = "p3_mode")]
    pub(crate) p3_mode: OrderMode,
    #[serde(default, alias = "variant_count")]
    #[validate(range(min = 1, max = 100, message = "variantCount must be between 1 and 100"))]
    pub(crate) variant_count: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamUploadResponse {
    pub(crate) ok: bool,
    pub(crate) exam_id: String,
    pub(crate) count: usize,
    pub(crate) variant_count: u32,
    pub(crate) method: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExamSummary {
    pub(crate) id: String,
    pub(crate) original_name: String,
    pub(crate) created_at: i64,
    pub(crate) time_minutes: u32,
    pub(crate) question_count: usize,
    pub(crate) has_answers: bool,
    pub(crate) has_password: bool,
    pub(crate) variants: usize,
}

impl From<&BaseExam> for ExamSummary {
    fn from(exam: &BaseExam) -> Self {
        Self {
            id: exam.id.clone(),
            original_name: exam.original_name.clone(),
            created_at: exam.created_at,
            time_minutes: exam.time_minutes,
            question_count: exam.questions.len(),
            has_answers: exam.has_answers(),
            has_password: exam.requires_password(),
            variants: exam.variants.len(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyPasswordRequest {
    #[serde(alias = "exam_id")]
    #[validate(length(min = 1, message = "examId must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(default)]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionTextUpdate {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CorrectAnswersUpdate {
    pub(crate) answers: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OkResponse {
    pub(crate) ok: bool,
}

impl OkResponse {
    pub(crate) fn ok() -> Self {
        Self { ok: true }
    }
}
