use rocket::{
    http::{Status, StatusClass},
    response::{status::Custom, Responder},
    serde::json::{json, Json, Value},
};
use thiserror::Error;

use crate::model::common::{autoclose::CloseReason, validation::ValidationIssue};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while serving a request.
///
/// The first group is infrastructure and surfaces as a generic failure;
/// the rest map one-to-one onto the rejection reasons clients must be able
/// to tell apart: "fix these fields", "verify your identity", "you already
/// responded" and "this form is closed" are never collapsed into one
/// generic message.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Argon2(#[from] argon2::Error),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unverified(String),
    #[error("A response from this respondent already exists")]
    DuplicateSubmission,
    #[error("This form is closed")]
    FormClosed {
        reason: Option<CloseReason>,
        message: Option<String>,
    },
    #[error("The submission is invalid")]
    Invalid(Vec<ValidationIssue>),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The machine-readable reason code clients branch on.
    fn reason(&self) -> &'static str {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) | Self::Internal(_) => "internal",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Unverified(_) => "unverified",
            Self::DuplicateSubmission => "duplicate",
            Self::FormClosed { .. } => "closed",
            Self::Invalid(_) => "invalid",
        }
    }

    fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) | Self::Internal(_) => {
                Status::InternalServerError
            }
            Self::BadRequest(_) => Status::BadRequest,
            Self::Unauthorized(_) | Self::Unverified(_) => Status::Unauthorized,
            Self::NotFound(_) => Status::NotFound,
            Self::DuplicateSubmission => Status::Conflict,
            Self::FormClosed { .. } => Status::Forbidden,
            Self::Invalid(_) => Status::UnprocessableEntity,
        }
    }

    /// The user-legible explanation carried in the body.
    fn detail(&self) -> String {
        match self {
            // Never leak internals to the respondent.
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) | Self::Internal(_) => {
                "Something went wrong, please try again later".to_string()
            }
            Self::FormClosed { reason, message } => match message {
                Some(message) => message.clone(),
                None => match reason {
                    Some(CloseReason::Deadline) => {
                        "The response deadline for this form has passed".to_string()
                    }
                    Some(CloseReason::MaxResponses) => {
                        "This form has reached its maximum number of responses".to_string()
                    }
                    None => "This form is not accepting responses".to_string(),
                },
            },
            other => other.to_string(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{:?}", self),
            _ => debug!("{:?}", self),
        }

        let mut body = json!({
            "reason": self.reason(),
            "detail": self.detail(),
        });
        match &self {
            Error::Invalid(issues) => {
                body["issues"] = json!(issues);
            }
            Error::FormClosed {
                reason: Some(reason),
                ..
            } => {
                body["closed_reason"] = Value::String(reason.as_code().to_string());
            }
            _ => {}
        }

        Custom(status, Json(body)).respond_to(req)
    }
}
