//! Error vocabulary for the upload orchestration service.
//!
//! Every failure surfaced over HTTP is an [`UploadError`]. The enum
//! implements [`axum::response::IntoResponse`] so handlers can simply
//! return `Err(UploadError::Validation { .. })`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Failures of the upload orchestration service.
#[derive(Debug, Error)]
pub enum UploadError {
    /// A request field is missing or malformed. Detected at the HTTP
    /// boundary or by the coordinator's local checks, never by the store.
    #[error("{message}")]
    Validation { message: String },

    /// Missing or invalid credentials/bucket at startup. Fatal: the store
    /// client binding is never constructed.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A failure returned by the object store. `code` carries the store's
    /// own error code (e.g. `NoSuchUpload`) when one was provided.
    #[error("{message}")]
    Store {
        code: Option<String>,
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl UploadError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        UploadError::Validation {
            message: message.into(),
        }
    }

    /// Stable error-type label used in the JSON body and in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Validation { .. } => "validation",
            UploadError::Configuration { .. } => "configuration",
            UploadError::Store { .. } => "store",
            UploadError::Internal(_) => "internal",
        }
    }

    /// Return the appropriate HTTP status code for this error.
    ///
    /// Store errors are classified by the store's error code: unknown
    /// upload/bucket/key map to 404, client-side part mistakes to 400,
    /// credential failures to 403, and anything else (network failure,
    /// throttling, provider outage) to 502 since the upstream store is the
    /// failing party.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            UploadError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            UploadError::Store { code, .. } => match code.as_deref() {
                Some("NoSuchUpload") | Some("NoSuchBucket") | Some("NoSuchKey") => {
                    StatusCode::NOT_FOUND
                }
                Some("InvalidPart")
                | Some("InvalidPartOrder")
                | Some("EntityTooSmall")
                | Some("EntityTooLarge")
                | Some("InvalidArgument")
                | Some("InvalidRequest") => StatusCode::BAD_REQUEST,
                Some("AccessDenied")
                | Some("SignatureDoesNotMatch")
                | Some("InvalidAccessKeyId")
                | Some("ExpiredToken") => StatusCode::FORBIDDEN,
                _ => StatusCode::BAD_GATEWAY,
            },
            UploadError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"error": {"type": ..., "code": ..., "message": ...}}`.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    message: String,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let status = self.status_code();

        let code = match &self {
            UploadError::Store { code, .. } => code.as_deref(),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                code,
                message: self.to_string(),
            },
        };

        (
            status,
            [
                ("content-type", "application/json".to_string()),
                ("x-request-id", request_id),
            ],
            serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string()),
        )
            .into_response()
    }
}

// -- Tests --------------------------------------------------------------------
