//! Abstract multipart-store contract.
//!
//! The coordinator talks to the object store exclusively through
//! [`MultipartStore`], so tests can substitute a fake and the production
//! binding can be built once and shared read-only across all requests.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::UploadError;

/// One uploaded part, identified by its position and the integrity token
/// the store returned when the part's bytes were uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PartDescriptor {
    /// Position of the part within the final assembled object (>= 1).
    pub part_number: i32,
    /// Opaque ETag returned by the store for this part. Passed back
    /// verbatim on completion; never verified locally.
    pub etag: String,
}

/// Result of creating a multipart upload at the store.
#[derive(Debug, Clone)]
pub struct CreatedUpload {
    /// Store-assigned upload session identifier.
    pub upload_id: String,
}

/// A signed, time-limited description of one part-upload HTTP request.
///
/// Ephemeral: never stored, expiration is embedded in the signature.
#[derive(Debug, Clone)]
pub struct PresignedPart {
    /// The signed URL the client PUTs the part bytes to.
    pub url: String,
    /// Headers the client must send alongside the URL. Empty when the
    /// signature is carried entirely in the query string.
    pub headers: Vec<(String, String)>,
}

/// Result of completing a multipart upload at the store.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    /// Location/URL of the assembled object, when the store provides one.
    pub location: Option<String>,
}

/// Async multipart-upload store contract.
///
/// Every operation is a single synchronous network call against the store
/// with no retry or timeout layered on top; failures surface immediately.
pub trait MultipartStore: Send + Sync + 'static {
    /// Create a multipart upload for `key`, returning the store-assigned
    /// upload ID.
    fn create_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedUpload, UploadError>> + Send + '_>>;

    /// Sign one part-upload request. Pure signing computation over the
    /// resolved credentials; no side effect on the store.
    fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<PresignedPart, UploadError>> + Send + '_>>;

    /// Complete the upload with `parts`, which the caller must already have
    /// put in ascending part-number order.
    fn complete_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> Pin<Box<dyn Future<Output = Result<CompletedUpload, UploadError>> + Send + '_>>;

    /// Abort the upload, releasing any parts already uploaded.
    fn abort_upload(
        &self,
        key: &str,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + '_>>;
}

// -- Test fake ----------------------------------------------------------------
