//! Store client parameter resolution and construction.
//!
//! [`resolve`] layers the explicit `storage` fields over the named profile
//! and produces one immutable [`ClientParams`] value; [`build_client`]
//! turns it into an `aws_sdk_s3::Client`. Both run exactly once per
//! process lifetime, so missing credentials fail at startup rather than at
//! first request.

use aws_sdk_s3::Client;
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::UploadError;

/// Fully resolved object-store connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientParams {
    /// Custom S3-compatible endpoint, when not talking to AWS proper.
    pub endpoint_url: Option<String>,
    /// Region the client signs for.
    pub region: String,
    /// Access key.
    pub access_key_id: String,
    /// Secret key.
    pub secret_access_key: String,
    /// Bucket every upload targets.
    pub bucket: String,
    /// Path-style addressing; only meaningful with a custom endpoint.
    pub use_path_style: bool,
}

/// Resolve [`ClientParams`] from the storage configuration.
///
/// Per-field precedence: explicit value on `storage`, then the named
/// profile's value. Credentials and bucket are mandatory; region defaults
/// to `us-east-1`. The path-style flag is only honored when an endpoint is
/// present, matching how S3-compatible stores are addressed.
pub fn resolve(storage: &StorageConfig) -> Result<ClientParams, UploadError> {
    let profile = storage.profiles.get(&storage.profile);

    let pick = |explicit: &Option<String>, from_profile: fn(&crate::config::StorageProfile) -> &Option<String>| {
        explicit
            .clone()
            .or_else(|| profile.and_then(|p| from_profile(p).clone()))
    };

    let bucket = pick(&storage.bucket, |p| &p.bucket).ok_or_else(|| missing("bucket", storage))?;
    let access_key_id =
        pick(&storage.access_key_id, |p| &p.access_key_id).ok_or_else(|| missing("access key", storage))?;
    let secret_access_key = pick(&storage.secret_access_key, |p| &p.secret_access_key)
        .ok_or_else(|| missing("secret key", storage))?;
    let region = pick(&storage.region, |p| &p.region).unwrap_or_else(|| "us-east-1".to_string());

    let endpoint_url = pick(&storage.endpoint_url, |p| &p.endpoint_url);
    let use_path_style = if endpoint_url.is_some() {
        storage
            .use_path_style
            .or_else(|| profile.and_then(|p| p.use_path_style))
            .unwrap_or(false)
    } else {
        false
    };

    Ok(ClientParams {
        endpoint_url,
        region,
        access_key_id,
        secret_access_key,
        bucket,
        use_path_style,
    })
}

fn missing(field: &str, storage: &StorageConfig) -> UploadError {
    UploadError::Configuration {
        message: format!(
            "no {field} configured: set storage.{} or define it in storage profile '{}'",
            field.replace(' ', "_"),
            storage.profile
        ),
    }
}

/// Build the S3 client from resolved parameters.
///
/// Built once at startup and shared read-only across all requests.
pub async fn build_client(params: &ClientParams) -> Client {
    let creds = aws_sdk_s3::config::Credentials::new(
        &params.access_key_id,
        &params.secret_access_key,
        None, // session_token
        None, // expiry
        "partgate-config",
    );

    let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(params.region.clone()))
        .credentials_provider(creds);

    if let Some(ref endpoint) = params.endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    let s3_config_builder =
        aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(params.use_path_style);

    info!(
        "Store client built: bucket={} region={} endpoint={}",
        params.bucket,
        params.region,
        params.endpoint_url.as_deref().unwrap_or("aws")
    );

    Client::from_conf(s3_config_builder.build())
}

// -- Tests --------------------------------------------------------------------
