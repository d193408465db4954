//! Object-store integration: the [`binding::MultipartStore`] contract, the
//! credential resolver, and the S3 binding.

pub mod binding;
pub mod client;
pub mod s3;
