mod handlers;
mod helpers;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_exams))
        .route("/upload", post(handlers::upload_exam))
        .route("/upload-file", post(handlers::upload_exam_file))
        .route("/latest", get(handlers::latest_exam))
        .route("/latest-variant", get(handlers::latest_variant))
        .route("/verify-password", post(handlers::verify_password))
        .route("/:exam_id", get(handlers::get_exam).delete(handlers::delete_exam))
        .route("/:exam_id/variant", get(handlers::get_variant))
        .route("/:exam_id/variants", get(handlers::list_variants))
        .route("/:exam_id/questions/:question_id/text", put(handlers::update_question_text))
        .route("/:exam_id/correct-answers", post(handlers::set_correct_answers))
}
