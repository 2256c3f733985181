use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
    pub(crate) role: UserRole,
    #[serde(rename = "className", skip_serializing_if = "Option::is_none")]
    pub(crate) class_name: Option<String>,
}
