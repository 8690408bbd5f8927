//! HTTP error responses.
//!
//! Every failed request gets the same JSON body:
//!
//! ```json
//! {"timestamp": "...", "status": 404, "kind": "not_found", "message": "Room not found"}
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{domain::ValueObjectError, usecase::RoomError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        let status = match e {
            RoomError::NotFound(_) => StatusCode::NOT_FOUND,
            RoomError::Forbidden(_) | RoomError::InvalidCredential => StatusCode::FORBIDDEN,
            RoomError::AlreadyMember | RoomError::AlreadyPending | RoomError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            RoomError::Validation(_) => StatusCode::BAD_REQUEST,
            RoomError::Storage(_) | RoomError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.kind(), e.to_string())
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(e: ValueObjectError) -> Self {
        RoomError::from(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                "Request failed: status={}, kind={}, message='{}'",
                self.status,
                self.kind,
                self.message
            );
        } else {
            tracing::warn!(
                "Request rejected: status={}, kind={}, message='{}'",
                self.status,
                self.kind,
                self.message
            );
        }

        let body = ErrorResponse {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: self.status.as_u16(),
            kind: self.kind.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
