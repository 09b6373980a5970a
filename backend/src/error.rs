use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Closed set of failures the search pipeline can report to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("The API key is invalid: {0}")]
    InvalidCredential(String),

    #[error("The API quota has been exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Access to the platform API was denied: {0}")]
    Forbidden(String),

    #[error("The requested resource was not found: {0}")]
    NotFound(String),

    #[error("Could not reach the video platform")]
    NetworkError,

    #[error("Unexpected platform error: {0}")]
    Unknown(String),

    #[error("Malformed request: {0}")]
    RequestMalformed(String),

    #[error("Missing required field: {0}")]
    InputMissing(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::InvalidCredential(_) => Status::Unauthorized,
            ApiError::QuotaExceeded(_) => Status::TooManyRequests,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::NetworkError => Status::ServiceUnavailable,
            ApiError::Unknown(_) => Status::InternalServerError,
            ApiError::RequestMalformed(_) | ApiError::InputMissing(_) => Status::BadRequest,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            ApiError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::NetworkError => "NETWORK_ERROR",
            ApiError::Unknown(_) => "UNKNOWN",
            ApiError::RequestMalformed(_) => "REQUEST_MALFORMED",
            ApiError::InputMissing(_) => "INPUT_MISSING",
        }
    }

    /// Whether the error was raised before any upstream call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApiError::RequestMalformed(_) | ApiError::InputMissing(_)
        )
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: Some(self.code().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn generic(code: Option<&str>) -> Self {
        ErrorResponse {
            error: "An internal error occurred".to_string(),
            code: code.map(str::to_string),
        }
    }
}

pub(crate) fn json_response(status: Status, body: &ErrorResponse) -> response::Result<'static> {
    let json = serde_json::to_string(body).map_err(|_| Status::InternalServerError)?;
    Response::build()
        .status(status)
        .header(ContentType::JSON)
        .sized_body(json.len(), Cursor::new(json))
        .ok()
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        json_response(self.status(), &self.to_response_body())
    }
}
