use crate::validation::{GuestIssue, SubmissionRejection};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::error;

/// Per-guest message returned when a submission is rejected
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GuestIssueResponse {
    pub index: usize,
    pub message: String,
}

impl From<&GuestIssue> for GuestIssueResponse {
    fn from(issue: &GuestIssue) -> Self {
        Self {
            index: issue.index,
            message: issue.reason.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    guests: Vec<GuestIssueResponse>,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
    details: Option<String>,
    guests: Vec<GuestIssueResponse>,
}

impl AppError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: None,
            guests: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_guests(mut self, issues: &[GuestIssue]) -> Self {
        self.guests = issues.iter().map(GuestIssueResponse::from).collect();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    // Common error constructors
    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn payload_too_large(message: &'static str) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn unsupported_media_type(message: &'static str) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    pub fn internal_server_error(message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),

            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::conflict("Resource already exists")
            }

            sqlx::Error::Database(db_err) => {
                error!("Database error: {}", db_err);
                Self::bad_request("Database error")
            }

            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::service_unavailable("Database unavailable")
            }

            other => {
                error!("Unexpected database error: {:?}", other);
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<axum::Error> for AppError {
    fn from(err: axum::Error) -> Self {
        Self::internal_server_error("Internal server error").with_details(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request("Validation error").with_details(err.to_string())
    }
}

impl From<validator::ValidationError> for AppError {
    fn from(err: validator::ValidationError) -> Self {
        let details = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string());
        Self::bad_request("Validation error").with_details(details)
    }
}

impl From<SubmissionRejection> for AppError {
    fn from(rejection: SubmissionRejection) -> Self {
        match &rejection {
            SubmissionRejection::Empty => Self::bad_request("At least one guest is required"),
            SubmissionRejection::InvalidGuests(issues) => {
                Self::bad_request("One or more guests are invalid").with_guests(issues)
            }
            SubmissionRejection::AlreadyResponded => {
                Self::conflict("You have already responded to this event")
            }
            SubmissionRejection::DuplicateGuests(issues) => {
                Self::conflict("One or more guests are already on the guest list").with_guests(issues)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.message,
            details: self.details,
            guests: self.guests,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ContactField, GuestRejection};

    #[test]
    fn test_submission_rejections_map_to_status_codes() {
        let issues = vec![GuestIssue {
            index: 1,
            reason: GuestRejection::AlreadyOnGuestList(ContactField::Email),
        }];

        let err = AppError::from(SubmissionRejection::DuplicateGuests(issues));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            err.guests,
            vec![GuestIssueResponse {
                index: 1,
                message: "A guest with this email is already on the guest list".to_string()
            }]
        );

        assert_eq!(
            AppError::from(SubmissionRejection::Empty).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(SubmissionRejection::AlreadyResponded).status(),
            StatusCode::CONFLICT
        );
    }
}
