//! Partgate library — multipart upload orchestration for S3-compatible
//! object stores.
//!
//! This crate provides the components for running an upload orchestration
//! service: the multipart upload coordinator, object key generation,
//! store credential resolution, the S3 store binding, and the HTTP
//! surface that exposes the four lifecycle operations.

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod handlers;
pub mod keygen;
pub mod metrics;
pub mod server;
pub mod store;

use crate::config::Config;
use crate::coordinator::UploadCoordinator;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// The multipart upload coordinator, built once over the immutable
    /// store client binding.
    pub coordinator: UploadCoordinator,
}
