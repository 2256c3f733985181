use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::security;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::schemas::auth::{LoginRequest, TokenResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Shared-password login. The teacher password wins over a class password with the same value.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let auth = state.settings().auth();
    let password = payload.password.trim();

    let (role, class_name) = if security::passwords_match(password, &auth.teacher_password) {
        (UserRole::Teacher, None)
    } else if let Some(class_name) = auth.class_for_password(password) {
        (UserRole::Student, Some(class_name.to_string()))
    } else {
        tracing::info!("Rejected login attempt");
        return Err(ApiError::Unauthorized("Incorrect password"));
    };

    let access_token =
        security::create_access_token(role, class_name.as_deref(), state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(role = ?role, class_name = ?class_name, "Login succeeded");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        role,
        class_name,
    }))
}
