use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::registration::dto::RegisterReply;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl RegistrationError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) | Self::InvalidBody(_) | Self::DuplicateEmail => {
                StatusCode::BAD_REQUEST
            }
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Persistence detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "All fields are required",
            Self::InvalidBody(_) => "Invalid request body",
            Self::DuplicateEmail => "Email already registered",
            Self::Persistence(_) => "Registration failed",
        }
    }
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        match &self {
            Self::Persistence(e) => error!(error = ?e, "registration failed"),
            other => warn!(reason = %other, "registration rejected"),
        }
        (self.status(), Json(RegisterReply::failure(self.public_message()))).into_response()
    }
}

/// Response for a handler that panicked; installed via `CatchPanicLayer`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!(panic = %detail, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RegisterReply::failure("Internal server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_and_messages() {
        let cases = [
            (
                RegistrationError::MissingFields(vec!["city"]),
                StatusCode::BAD_REQUEST,
                "All fields are required",
            ),
            (
                RegistrationError::DuplicateEmail,
                StatusCode::BAD_REQUEST,
                "Email already registered",
            ),
            (
                RegistrationError::Persistence(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed",
            ),
        ];
        for (err, status, message) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.public_message(), message);
        }
    }

    #[test]
    fn missing_fields_display_lists_names() {
        let err = RegistrationError::MissingFields(vec!["email", "city"]);
        assert_eq!(err.to_string(), "missing required fields: email, city");
    }
}
