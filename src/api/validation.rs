use std::path::Path;

use crate::api::errors::ApiError;

const ALLOWED_TEXT_EXTENSIONS: &[&str] = &["txt", "text"];

/// Uploaded exam files must be plain UTF-8 text; document conversion happens before upload.
pub(crate) fn validate_text_upload(filename: &str, content_type: &str) -> Result<(), ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !ALLOWED_TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    if mime.is_empty() || matches!(mime.as_str(), "text/plain" | "application/octet-stream") {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "MIME type '{mime}' does not match extension '.{extension}'"
        )))
    }
}

pub(crate) fn decode_text(bytes: &[u8]) -> Result<String, ApiError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ApiError::BadRequest("File must be UTF-8 text".to_string()))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}
