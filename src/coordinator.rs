//! Multipart upload coordinator.
//!
//! The core of the service: sequences the four lifecycle operations
//! (initiate, per-part presigning, completion, abort) against the store
//! binding, generates object keys, and enforces the local ordering and
//! validation rules the multipart protocol requires.
//!
//! The coordinator is stateless across calls. The upload session lives
//! only inside the remote store, referenced by `upload_id`; every
//! operation after `initiate` must be given `upload_id` and `key` by the
//! caller. Illegal lifecycle sequences (e.g. presigning after abort) are
//! rejected by the store, not pre-validated here.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::errors::UploadError;
use crate::keygen;
use crate::store::binding::{MultipartStore, PartDescriptor};

/// Highest part number S3-compatible stores accept.
///
/// The protocol caps uploads at 10,000 parts; values above are rejected
/// here before any store interaction.
pub const MAX_PART_NUMBER: i32 = 10_000;

/// Content type used when the caller does not supply one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Result of [`UploadCoordinator::initiate`].
#[derive(Debug, Clone)]
pub struct InitiatedUpload {
    /// Store-assigned upload session identifier.
    pub upload_id: String,
    /// Generated object key the upload will materialize at.
    pub key: String,
}

/// Result of [`UploadCoordinator::presign_part`].
#[derive(Debug, Clone)]
pub struct PresignedPartRequest {
    /// Signed URL authorizing one part upload.
    pub url: String,
    /// Part number the URL was signed for.
    pub part_number: i32,
    /// Headers the client must send, if the signature is not fully
    /// query-embedded.
    pub headers: Vec<(String, String)>,
}

/// Result of [`UploadCoordinator::complete`].
#[derive(Debug, Clone)]
pub struct CompletedObject {
    /// Final object key.
    pub key: String,
    /// Location of the assembled object, when the store provides one.
    pub location: Option<String>,
}

/// Orchestrates multipart uploads against an injected store binding.
///
/// Holds no mutable state; safe to share across any number of concurrent
/// requests.
pub struct UploadCoordinator {
    store: Arc<dyn MultipartStore>,
    key_prefix: String,
    presign_expiry: Duration,
}

impl UploadCoordinator {
    /// Construct a coordinator over `store`.
    ///
    /// `key_prefix` and `presign_expiry` are fixed for the process
    /// lifetime (configuration surface, read once at startup).
    pub fn new(store: Arc<dyn MultipartStore>, key_prefix: String, presign_expiry: Duration) -> Self {
        Self {
            store,
            key_prefix,
            presign_expiry,
        }
    }

    /// Configured presigned-URL lifetime.
    pub fn presign_expiry(&self) -> Duration {
        self.presign_expiry
    }

    /// Start a multipart upload for `file_name`.
    ///
    /// Generates a fresh collision-resistant key and asks the store to
    /// create the upload session. Not idempotent: two calls with the same
    /// filename create two unrelated uploads, each a storage-cost
    /// liability until completed or aborted.
    ///
    /// The filename is reduced to its final path component before key
    /// generation; an empty remainder is a validation error.
    pub async fn initiate(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<InitiatedUpload, UploadError> {
        let file_name = keygen::sanitize_file_name(file_name)
            .ok_or_else(|| UploadError::validation("file_name must contain a usable filename"))?;

        let key = keygen::generate(&self.key_prefix, file_name);
        let created = self.store.create_upload(&key, content_type).await?;

        info!(
            "initiated multipart upload: upload_id={} key={}",
            created.upload_id, key
        );

        Ok(InitiatedUpload {
            upload_id: created.upload_id,
            key,
        })
    }

    /// Issue a presigned URL for one part of an in-flight upload.
    ///
    /// Validates `1 <= part_number <= 10_000` locally; the validity of
    /// `upload_id` itself is only checked by the store when the client
    /// actually uploads the part.
    pub async fn presign_part(
        &self,
        upload_id: &str,
        key: &str,
        part_number: i32,
    ) -> Result<PresignedPartRequest, UploadError> {
        if part_number < 1 {
            return Err(UploadError::validation(format!(
                "part_number must be >= 1, got {part_number}"
            )));
        }
        if part_number > MAX_PART_NUMBER {
            return Err(UploadError::validation(format!(
                "part_number must be <= {MAX_PART_NUMBER}, got {part_number}"
            )));
        }

        let presigned = self
            .store
            .presign_part(key, upload_id, part_number, self.presign_expiry)
            .await?;

        Ok(PresignedPartRequest {
            url: presigned.url,
            part_number,
            headers: presigned.headers,
        })
    }

    /// Complete an upload from the parts the client uploaded.
    ///
    /// The store requires strictly ascending, unique part numbers; the
    /// coordinator's only responsibility is the ordering. Parts are
    /// stable-sorted ascending by part number, so submission order does
    /// not matter. Duplicate part numbers and ETag correctness are left
    /// for the store to reject.
    pub async fn complete(
        &self,
        upload_id: &str,
        key: &str,
        mut parts: Vec<PartDescriptor>,
    ) -> Result<CompletedObject, UploadError> {
        if parts.is_empty() {
            return Err(UploadError::validation("parts must not be empty"));
        }

        parts.sort_by_key(|p| p.part_number);

        let completed = self.store.complete_upload(key, upload_id, &parts).await?;

        info!(
            "completed multipart upload: upload_id={} key={} parts={}",
            upload_id,
            key,
            parts.len()
        );

        Ok(CompletedObject {
            key: key.to_string(),
            location: completed.location,
        })
    }

    /// Abort an upload, releasing any parts already uploaded at the store.
    ///
    /// Pass-through semantics: the store's outcome is propagated verbatim.
    /// Aborting an unknown, already-aborted, or already-completed upload
    /// deterministically surfaces the store's `NoSuchUpload` error
    /// (classified 404); it is never retried or swallowed. If the abort
    /// itself fails, the upload stays orphaned at the store and must be
    /// reconciled by a bucket lifecycle rule.
    pub async fn abort(&self, upload_id: &str, key: &str) -> Result<(), UploadError> {
        self.store.abort_upload(key, upload_id).await?;

        info!(
            "aborted multipart upload: upload_id={} key={}",
            upload_id, key
        );

        Ok(())
    }
}

// -- Tests --------------------------------------------------------------------
