use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use super::utils::PayloadError;
use crate::recipes::ValidationErrors;
use crate::store::StoreError;

/// The endpoint a failure happened in; picks the human-readable `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    List,
    Get,
    Update,
    Delete,
}

impl Action {
    pub fn failure_message(self) -> &'static str {
        match self {
            Action::Create => "Error creating recipe",
            Action::List => "Error fetching recipes",
            Action::Get => "Error retrieving the recipe",
            Action::Update => "Error updating the recipe",
            Action::Delete => "Error deleting the recipe",
        }
    }
}

pub const NOT_FOUND_MESSAGE: &str = "Recipe not found";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {source}")]
    Payload {
        action: Action,
        #[source]
        source: PayloadError,
    },
    #[error("{source}")]
    Validation {
        action: Action,
        #[source]
        source: ValidationErrors,
    },
    #[error("Recipe not found")]
    NotFound,
    #[error("{source}")]
    Conflict {
        action: Action,
        #[source]
        source: StoreError,
    },
    #[error("{source}")]
    Store {
        action: Action,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn payload(action: Action, source: PayloadError) -> Self {
        ApiError::Payload { action, source }
    }

    pub fn validation(action: Action, source: ValidationErrors) -> Self {
        ApiError::Validation { action, source }
    }

    /// Title collisions become 409; every other store failure is a 500.
    pub fn store(action: Action, source: StoreError) -> Self {
        if source.is_duplicate() {
            ApiError::Conflict { action, source }
        } else {
            ApiError::Store { action, source }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Payload {
                source: PayloadError::TooLarge { .. },
                ..
            } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Payload { .. } => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Payload { .. } => "INVALID_PAYLOAD",
            ApiError::Validation { .. } => "VALIDATION_FAILED",
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Conflict { .. } => "DUPLICATE_TITLE",
            ApiError::Store { .. } => "STORE_ERROR",
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::NotFound => ErrorResponse {
                message: NOT_FOUND_MESSAGE,
                error: None,
            },
            ApiError::Payload { action, source } => ErrorResponse {
                message: action.failure_message(),
                error: Some(source.to_string()),
            },
            ApiError::Validation { action, source } => ErrorResponse {
                message: action.failure_message(),
                error: Some(source.to_string()),
            },
            ApiError::Conflict { action, source } | ApiError::Store { action, source } => {
                ErrorResponse {
                    message: action.failure_message(),
                    error: Some(source.to_string()),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
