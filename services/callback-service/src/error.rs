use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Per-request failures. All of them reach the caller as a 500 with the
// plain-text message as the body; success stays structured JSON.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("read request body: {0}")]
    BodyRead(axum::Error),

    #[error("parse message from {body}: {source}")]
    Decode {
        body: String,
        source: serde_json::Error,
    },

    #[error("invalid message {0}")]
    InvalidAction(String),
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

// Startup-fatal supervisor failures; the service never serves past these.
#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("start recognizer {bin}: {source}")]
    Spawn {
        bin: String,
        source: std::io::Error,
    },

    #[error("recognizer {0} pipe unavailable")]
    Pipe(&'static str),
}
