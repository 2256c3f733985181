use serde::{Deserialize, Serialize};
use validator::Validate;

/// A student's answers. `answers` maps base question ids to the submitted value.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionCreate {
    #[serde(default)]
    #[validate(length(max = 128, message = "id is too long"))]
    pub(crate) id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255, message = "name is too long"))]
    pub(crate) name: Option<String>,
    #[serde(default, alias = "class_name")]
    #[validate(length(max = 64, message = "className is too long"))]
    pub(crate) class_name: Option<String>,
    #[serde(default)]
    pub(crate) dob: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email is invalid"))]
    pub(crate) email: Option<String>,
    #[serde(default, alias = "exam_id")]
    pub(crate) exam_id: Option<String>,
    #[serde(default)]
    pub(crate) answers: serde_json::Value,
    #[serde(default)]
    pub(crate) violations: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) ok: bool,
    pub(crate) score: Option<f64>,
}
