use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::{BattleError, StorageError};
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Engine(BattleError),
    Validation(ValidationErrors),
    Unauthorized,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Engine(e) => match e {
                BattleError::Validation(_) => StatusCode::BAD_REQUEST,
                BattleError::NotFound { .. } => StatusCode::NOT_FOUND,
                BattleError::NotEligible { .. } => StatusCode::FORBIDDEN,
                BattleError::DuplicateCandidacy { .. }
                | BattleError::DuplicateJudge { .. }
                | BattleError::InvalidTransition { .. }
                | BattleError::InvalidState(_)
                | BattleError::NoWinner(_) => StatusCode::CONFLICT,
                BattleError::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
                BattleError::Storage(StorageError::Database(_)) => StatusCode::SERVICE_UNAVAILABLE,
                BattleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Engine(e) => match e {
                BattleError::Validation(_) => "validation_error",
                BattleError::NotFound { .. } => "not_found",
                BattleError::NotEligible { .. } => "not_eligible",
                BattleError::DuplicateCandidacy { .. } => "duplicate_candidacy",
                BattleError::DuplicateJudge { .. } => "duplicate_judge",
                BattleError::InvalidTransition { .. } => "invalid_transition",
                BattleError::InvalidState(_) => "invalid_state",
                BattleError::NoWinner(_) => "no_winner",
                BattleError::Storage(_) => "storage_error",
            },
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let kind = self.kind();

        let body = match &self {
            Self::Engine(BattleError::Storage(e)) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred",
                    "kind": kind,
                    "retryable": matches!(e, StorageError::Database(_))
                })
            }
            Self::Engine(e) => {
                json!({
                    "error": e.to_string(),
                    "kind": kind
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "kind": kind,
                    "details": field_errors
                })
            }
            Self::Unauthorized => {
                tracing::warn!("Invalid API key attempt");
                json!({
                    "error": "Unauthorized",
                    "kind": kind
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<BattleError> for WebError {
    fn from(error: BattleError) -> Self {
        Self::Engine(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}
