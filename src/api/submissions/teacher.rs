use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::state::AppState;
use crate::db::models::ResultRecord;
use crate::repositories;

pub(super) async fn list_class_results(
    Path(class_name): Path<String>,
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<ResultRecord>>, ApiError> {
    let results = repositories::results::list_for_class(state.data_dir(), class_name.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load class results"))?;

    Ok(Json(results))
}
