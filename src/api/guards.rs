use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, Claims};
use crate::core::state::AppState;
use crate::db::types::UserRole;

/// A request carrying a valid teacher token.
pub(crate) struct CurrentTeacher(pub(crate) Claims);

/// Claims of a valid bearer token, if one was sent. Invalid tokens count as anonymous.
pub(crate) struct OptionalClaims(pub(crate) Option<Claims>);

impl OptionalClaims {
    pub(crate) fn is_teacher(&self) -> bool {
        self.0.as_ref().is_some_and(|claims| claims.role == UserRole::Teacher)
    }

    pub(crate) fn class_name(&self) -> Option<&str> {
        self.0.as_ref().and_then(|claims| claims.class_name.as_deref())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeacher {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        if claims.role != UserRole::Teacher {
            return Err(ApiError::Forbidden("Teacher access required"));
        }

        Ok(CurrentTeacher(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_token(parts).and_then(|token| {
            security::verify_token(token, state.settings())
                .inspect_err(|err| tracing::debug!(error = %err, "Ignoring invalid bearer token"))
                .ok()
        });

        Ok(OptionalClaims(claims))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
