use rand::Rng;

use crate::api::errors::ApiError;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::now_unix_millis;
use crate::db::models::{BaseExam, ShuffleConfig};
use crate::repositories;
use crate::schemas::exam::{ExamUploadOptions, ExamUploadResponse};
use crate::services::exam_parser::parse_exam;
use crate::services::variants::base_exam_id;

pub(super) const PARSE_METHOD: &str = "rules";

/// `exam_{millis}_{8 hex}`. Never contains a variant marker.
pub(super) fn new_exam_id() -> String {
    format!("exam_{}_{:08x}", now_unix_millis(), rand::thread_rng().gen::<u32>())
}

/// Parses the text, persists a new base exam and reports what was stored.
pub(super) async fn create_exam_from_text(
    state: &AppState,
    original_name: &str,
    text: &str,
    options: ExamUploadOptions,
    channel: &'static str,
) -> Result<ExamUploadResponse, ApiError> {
    let parsed = parse_exam(text);
    if parsed.is_empty() {
        return Err(ApiError::BadRequest("No questions found".to_string()));
    }

    let shuffle_config = ShuffleConfig {
        p1_mode: options.p1_mode,
        p2_mode: options.p2_mode,
        p3_mode: options.p3_mode,
        variant_count: options.variant_count.unwrap_or(1),
    };

    let exam = BaseExam {
        id: new_exam_id(),
        original_name: original_name.trim().to_string(),
        created_at: now_unix_millis(),
        time_minutes: options
            .time_minutes
            .unwrap_or(state.settings().exam().default_time_minutes),
        password: options.password.map(|value| value.trim().to_string()).filter(|value| !value.is_empty()),
        sections: parsed.sections,
        questions: parsed.questions,
        answers: Default::default(),
        shuffle_config,
        variants: Vec::new(),
        parsed_by: Some(PARSE_METHOD.to_string()),
    };

    repositories::exams::save(state.data_dir(), &exam)
        .await
        .map_err(|e| ApiError::store(e, "Failed to save exam"))?;

    metrics::record_exam_upload(channel);
    tracing::info!(
        exam_id = %exam.id,
        questions = exam.questions.len(),
        channel,
        "Exam uploaded"
    );

    Ok(ExamUploadResponse {
        ok: true,
        exam_id: exam.id,
        count: exam.questions.len(),
        variant_count: exam.shuffle_config.variant_count,
        method: PARSE_METHOD,
    })
}

/// Loads the base exam behind an exam or variant id.
pub(super) async fn load_base_exam(state: &AppState, exam_id: &str) -> Result<BaseExam, ApiError> {
    let base_id = base_exam_id(exam_id);
    repositories::exams::find_by_id(state.data_dir(), base_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound(format!("Exam '{base_id}' not found")))
}

pub(super) async fn save_exam(state: &AppState, exam: &BaseExam) -> Result<(), ApiError> {
    repositories::exams::save(state.data_dir(), exam)
        .await
        .map_err(|e| ApiError::store(e, "Failed to save exam"))
}
