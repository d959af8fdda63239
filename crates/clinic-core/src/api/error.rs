//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::Error;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn unauthenticated(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else if err.is_conflict() {
            StatusCode::CONFLICT
        } else {
            match &err {
                Error::Unauthorized(_) => StatusCode::FORBIDDEN,
                Error::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::QueueEntryNotFound(1), StatusCode::NOT_FOUND),
            (Error::DoctorNotFound(2), StatusCode::NOT_FOUND),
            (
                Error::AlreadyQueued {
                    patient_id: 1,
                    doctor_id: 2,
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                },
                StatusCode::CONFLICT,
            ),
            (Error::PatientAlreadyExists("x".into()), StatusCode::CONFLICT),
            (Error::unauthorized("no"), StatusCode::FORBIDDEN),
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (Error::Database(sqlx::Error::PoolClosed), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
