mod student;
mod teacher;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        // Student endpoints
        .route("/", post(student::submit_exam))
        // Teacher endpoints
        .route("/classes/:class_name", get(teacher::list_class_results))
}
