//! Error responses of the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use manager_lib::{auth::AuthError, ManagerError};
use serde::{Deserialize, Serialize};

/// JSON body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A failed request: status code plus the body sent back
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, title: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: title.into(),
                details,
            },
        }
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid parameter", Some(details.into()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        let status = match err {
            ManagerError::NotFound => StatusCode::NOT_FOUND,
            ManagerError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ManagerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ManagerError::CollaboratorUnavailable(_) | ManagerError::InvalidPayload(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        Self::new(status, err.title(), err.details().map(str::to_string))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let title = err.to_string();
        match err {
            AuthError::MissingToken => Self::new(
                StatusCode::BAD_REQUEST,
                "Missing header value",
                Some("Authorization".to_string()),
            ),
            AuthError::VerifierUnreachable(details) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, title, Some(details))
            }
            AuthError::Rejected { body, .. } => Self::new(
                StatusCode::UNAUTHORIZED,
                title,
                Some(body).filter(|b| !b.is_empty()),
            ),
            AuthError::NotAdministrator => Self::new(StatusCode::UNAUTHORIZED, title, None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
