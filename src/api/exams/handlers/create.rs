use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation::{decode_text, validate_text_upload};
use crate::core::state::AppState;
use crate::schemas::exam::{ExamUpload, ExamUploadOptions, ExamUploadResponse};

use super::super::helpers;

const NUMERIC_FIELDS: &[&str] = &["timeMinutes", "time_minutes", "variantCount", "variant_count"];
const OPTION_FIELDS: &[&str] = &[
    "timeMinutes",
    "time_minutes",
    "password",
    "p1Mode",
    "p1_mode",
    "p2Mode",
    "p2_mode",
    "p3Mode",
    "p3_mode",
    "variantCount",
    "variant_count",
];

pub(in crate::api::exams) async fn upload_exam(
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpload>,
) -> Result<(StatusCode, Json<ExamUploadResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let response = helpers::create_exam_from_text(
        &state,
        &payload.original_name,
        &payload.text,
        payload.options,
        "json",
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Multipart variant of `upload_exam`: a `file` part holding UTF-8 text plus optional form fields.
pub(in crate::api::exams) async fn upload_exam_file(
    CurrentTeacher(_teacher): CurrentTeacher,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ExamUploadResponse>), ApiError> {
    let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut original_name: Option<String> = None;
    let mut fields = Map::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
            {
                if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                    return Err(ApiError::PayloadTooLarge(format!(
                        "File size exceeds {}MB limit",
                        state.settings().storage().max_upload_size_mb
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            file_bytes = Some(bytes);
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|_| ApiError::BadRequest(format!("Invalid form field '{name}'")))?;
        if matches!(name.as_str(), "originalName" | "original_name") {
            original_name = Some(text);
        } else if OPTION_FIELDS.contains(&name.as_str()) && !text.trim().is_empty() {
            fields.insert(name.clone(), form_value(&name, text.trim())?);
        }
    }

    let file_bytes = file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    let filename = filename.unwrap_or_else(|| "exam.txt".to_string());
    let content_type = content_type.unwrap_or_default();
    validate_text_upload(&filename, &content_type)?;

    let text = decode_text(&file_bytes)?;
    let options: ExamUploadOptions = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::BadRequest(format!("Invalid exam options: {e}")))?;
    options.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let original_name = original_name.unwrap_or(filename);
    let response =
        helpers::create_exam_from_text(&state, &original_name, &text, options, "file").await?;

    Ok((StatusCode::CREATED, Json(response)))
}

fn form_value(name: &str, text: &str) -> Result<Value, ApiError> {
    if NUMERIC_FIELDS.contains(&name) {
        let number = text
            .parse::<u32>()
            .map_err(|_| ApiError::BadRequest(format!("{name} must be a positive integer")))?;
        return Ok(Value::from(number));
    }
    Ok(Value::String(text.to_string()))
}
