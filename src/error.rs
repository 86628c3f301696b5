use axum::{http::StatusCode, Json};
use serde::Serialize;

/// `{"message": "..."}` body used for every non-2xx answer and for plain
/// acknowledgements.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<MessageResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(MessageResponse::new(message)))
}

/// 500 with a fixed message; the cause goes to the log, not the client.
pub fn internal(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// 400 for a request an extractor could not parse (JSON body, path, query).
pub fn bad_request(rejection: impl std::fmt::Display) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, rejection.to_string())
}
