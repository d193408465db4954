//! S3 multipart-store binding.
//!
//! Implements [`MultipartStore`] against a real S3-compatible provider via
//! the AWS SDK. Each trait method is exactly one SDK call; store failures
//! are mapped to [`UploadError::Store`] with the provider's error code and
//! message carried through verbatim.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use super::binding::{CompletedUpload, CreatedUpload, MultipartStore, PartDescriptor, PresignedPart};
use crate::errors::UploadError;

/// Store binding that forwards multipart operations to an S3-compatible
/// provider. Immutable after construction; safe to share across requests.
pub struct S3MultipartStore {
    /// AWS S3 SDK client.
    client: Client,
    /// Bucket every upload targets.
    bucket: String,
}

impl S3MultipartStore {
    /// Wrap an already-built client and target bucket.
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Map an AWS SDK error to the service's store-error variant.
    ///
    /// Service errors keep the provider's code and message; transport
    /// failures (DNS, timeouts, malformed responses) carry no code and are
    /// later classified as an upstream fault.
    fn map_sdk_error<E, R>(op: &str, err: SdkError<E, R>) -> UploadError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        match &err {
            SdkError::ServiceError(ctx) => UploadError::Store {
                code: ctx.err().code().map(str::to_string),
                message: format!(
                    "{op}: {}",
                    ctx.err().message().unwrap_or("unspecified store error")
                ),
            },
            _ => UploadError::Store {
                code: None,
                message: format!("{op}: {}", DisplayErrorContext(&err)),
            },
        }
    }
}

impl MultipartStore for S3MultipartStore {
    fn create_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = Result<CreatedUpload, UploadError>> + Send + '_>> {
        let key = key.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            debug!(
                "create_multipart_upload: bucket={} key={} content_type={}",
                self.bucket, key, content_type
            );

            let resp = self
                .client
                .create_multipart_upload()
                .bucket(&self.bucket)
                .key(&key)
                .content_type(&content_type)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("create_multipart_upload", e))?;

            let upload_id = resp
                .upload_id()
                .ok_or_else(|| UploadError::Store {
                    code: None,
                    message: "create_multipart_upload: store returned no upload ID".to_string(),
                })?
                .to_string();

            Ok(CreatedUpload { upload_id })
        })
    }

    fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<PresignedPart, UploadError>> + Send + '_>> {
        let key = key.to_string();
        let upload_id = upload_id.to_string();
        Box::pin(async move {
            debug!(
                "presign upload_part: bucket={} key={} upload_id={} part_number={} expires_in={}s",
                self.bucket,
                key,
                upload_id,
                part_number,
                expires_in.as_secs()
            );

            let presign_config =
                PresigningConfig::expires_in(expires_in).map_err(|e| UploadError::Configuration {
                    message: format!("invalid presign expiry: {e}"),
                })?;

            let presigned = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(&key)
                .upload_id(&upload_id)
                .part_number(part_number)
                .presigned(presign_config)
                .await
                .map_err(|e| Self::map_sdk_error("presign upload_part", e))?;

            let headers = presigned
                .headers()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();

            Ok(PresignedPart {
                url: presigned.uri().to_string(),
                headers,
            })
        })
    }

    fn complete_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[PartDescriptor],
    ) -> Pin<Box<dyn Future<Output = Result<CompletedUpload, UploadError>> + Send + '_>> {
        let key = key.to_string();
        let upload_id = upload_id.to_string();
        let completed_parts: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();
        Box::pin(async move {
            debug!(
                "complete_multipart_upload: bucket={} key={} upload_id={} parts={}",
                self.bucket,
                key,
                upload_id,
                completed_parts.len()
            );

            let completed_upload = CompletedMultipartUpload::builder()
                .set_parts(Some(completed_parts))
                .build();

            let resp = self
                .client
                .complete_multipart_upload()
                .bucket(&self.bucket)
                .key(&key)
                .upload_id(&upload_id)
                .multipart_upload(completed_upload)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("complete_multipart_upload", e))?;

            Ok(CompletedUpload {
                location: resp.location().map(|s| s.to_string()),
            })
        })
    }

    fn abort_upload(
        &self,
        key: &str,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), UploadError>> + Send + '_>> {
        let key = key.to_string();
        let upload_id = upload_id.to_string();
        Box::pin(async move {
            debug!(
                "abort_multipart_upload: bucket={} key={} upload_id={}",
                self.bucket, key, upload_id
            );

            self.client
                .abort_multipart_upload()
                .bucket(&self.bucket)
                .key(&key)
                .upload_id(&upload_id)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("abort_multipart_upload", e))?;

            Ok(())
        })
    }
}
