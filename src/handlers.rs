//! HTTP handlers for the four multipart upload operations.
//!
//! Thin boundary layer: each handler validates its request DTO with
//! `garde`, hands off to the [`UploadCoordinator`], and shapes the JSON
//! response. No upload state lives here.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Json, State};
use garde::Validate;
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::coordinator::DEFAULT_CONTENT_TYPE;
use crate::errors::UploadError;
use crate::metrics::UPLOAD_OPERATIONS_TOTAL;
use crate::store::binding::PartDescriptor;
use crate::AppState;

// -- Request / response DTOs --------------------------------------------------

/// `POST /initiate` request body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InitiateRequest {
    /// Client-supplied filename, embedded in the generated key.
    #[garde(length(min = 1))]
    pub file_name: String,
    /// MIME type of the final object; defaults to
    /// `application/octet-stream`.
    #[garde(skip)]
    pub content_type: Option<String>,
}

/// `POST /initiate` response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct InitiateResponse {
    pub upload_id: String,
    pub file_path: String,
}

/// `POST /presign-part` request body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PresignPartRequest {
    #[garde(length(min = 1))]
    pub upload_id: String,
    #[garde(length(min = 1))]
    pub file_path: String,
    /// Part position, starting at 1.
    #[garde(range(min = 1))]
    pub part_number: i32,
}

/// `POST /presign-part` response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct PresignPartResponse {
    pub presigned_url: String,
    pub part_number: i32,
    /// Headers the client must send with the part PUT; empty when the
    /// signature is fully query-embedded.
    pub headers: HashMap<String, String>,
}

/// `POST /complete` request body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompleteRequest {
    #[garde(length(min = 1))]
    pub upload_id: String,
    #[garde(length(min = 1))]
    pub file_path: String,
    /// Parts the client uploaded, in any order.
    #[garde(length(min = 1))]
    pub parts: Vec<PartDescriptor>,
}

/// `POST /complete` response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteResponse {
    pub file_path: String,
    pub location: Option<String>,
}

/// `POST /abort` request body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AbortRequest {
    #[garde(length(min = 1))]
    pub upload_id: String,
    #[garde(length(min = 1))]
    pub file_path: String,
}

/// `POST /abort` response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct AbortResponse {
    pub message: String,
}

// -- Helpers ------------------------------------------------------------------

/// Run garde validation, mapping the report into the service's validation
/// error.
fn validate<T: Validate<Context = ()>>(req: &T) -> Result<(), UploadError> {
    req.validate()
        .map_err(|report| UploadError::validation(report.to_string()))
}

/// Count one coordinator operation by outcome.
fn record_operation<T>(operation: &'static str, result: &Result<T, UploadError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    counter!(UPLOAD_OPERATIONS_TOTAL, "operation" => operation, "outcome" => outcome)
        .increment(1);
}

// -- Handlers -----------------------------------------------------------------

/// `POST /initiate` -- start a multipart upload.
#[utoipa::path(
    post,
    path = "/initiate",
    tag = "Upload",
    operation_id = "InitiateUpload",
    request_body = InitiateRequest,
    responses(
        (status = 200, description = "Upload session created", body = InitiateResponse),
        (status = 422, description = "Missing or malformed request fields"),
        (status = 502, description = "Store failure")
    )
)]
pub async fn initiate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitiateRequest>,
) -> Result<Json<InitiateResponse>, UploadError> {
    validate(&req)?;

    let content_type = req.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    let result = state.coordinator.initiate(&req.file_name, content_type).await;
    record_operation("initiate", &result);
    let up = result?;

    Ok(Json(InitiateResponse {
        upload_id: up.upload_id,
        file_path: up.key,
    }))
}

/// `POST /presign-part` -- issue a presigned URL for one part.
#[utoipa::path(
    post,
    path = "/presign-part",
    tag = "Upload",
    operation_id = "PresignPart",
    request_body = PresignPartRequest,
    responses(
        (status = 200, description = "Presigned part request issued", body = PresignPartResponse),
        (status = 422, description = "Missing or malformed request fields"),
        (status = 502, description = "Store failure")
    )
)]
pub async fn presign_part(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PresignPartRequest>,
) -> Result<Json<PresignPartResponse>, UploadError> {
    validate(&req)?;

    let result = state
        .coordinator
        .presign_part(&req.upload_id, &req.file_path, req.part_number)
        .await;
    record_operation("presign_part", &result);
    let presigned = result?;

    Ok(Json(PresignPartResponse {
        presigned_url: presigned.url,
        part_number: presigned.part_number,
        headers: presigned.headers.into_iter().collect(),
    }))
}

/// `POST /complete` -- finalize an upload from its parts.
#[utoipa::path(
    post,
    path = "/complete",
    tag = "Upload",
    operation_id = "CompleteUpload",
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Object assembled", body = CompleteResponse),
        (status = 404, description = "Unknown upload"),
        (status = 422, description = "Missing or malformed request fields"),
        (status = 502, description = "Store failure")
    )
)]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, UploadError> {
    validate(&req)?;

    let result = state
        .coordinator
        .complete(&req.upload_id, &req.file_path, req.parts)
        .await;
    record_operation("complete", &result);
    let done = result?;

    Ok(Json(CompleteResponse {
        file_path: done.key,
        location: done.location,
    }))
}

/// `POST /abort` -- abandon an upload and release its parts.
#[utoipa::path(
    post,
    path = "/abort",
    tag = "Upload",
    operation_id = "AbortUpload",
    request_body = AbortRequest,
    responses(
        (status = 200, description = "Upload aborted", body = AbortResponse),
        (status = 404, description = "Unknown or already-ended upload"),
        (status = 422, description = "Missing or malformed request fields"),
        (status = 502, description = "Store failure")
    )
)]
pub async fn abort(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AbortRequest>,
) -> Result<Json<AbortResponse>, UploadError> {
    validate(&req)?;

    let result = state.coordinator.abort(&req.upload_id, &req.file_path).await;
    record_operation("abort", &result);
    result?;

    Ok(Json(AbortResponse {
        message: "Multipart upload aborted".to_string(),
    }))
}

// -- Tests --------------------------------------------------------------------
