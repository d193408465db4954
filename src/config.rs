//! Configuration loading and types for Partgate.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Each subsection governs a different part of the
//! system: networking, object-store connection parameters, upload key
//! generation and presigning, route exposure, and observability.
//!
//! Store connection parameters are layered: explicit fields under
//! `storage` override the values of the named profile in
//! `storage.profiles`. Resolution happens once at startup in
//! [`crate::store::client::resolve`] and produces one immutable
//! `ClientParams` value.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Object-store connection settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Upload key generation and presigning settings.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Route exposure settings.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings (metrics + health probes).
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Object-store connection configuration.
///
/// The explicit fields on this struct override the corresponding fields of
/// the profile named by `profile`. Credentials and bucket are mandatory
/// after layering; everything else has a usable default.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Name of the storage profile to fall back to.
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Named storage profiles.
    #[serde(default)]
    pub profiles: HashMap<String, StorageProfile>,

    /// Explicit bucket override.
    #[serde(default)]
    pub bucket: Option<String>,

    /// Explicit region override.
    #[serde(default)]
    pub region: Option<String>,

    /// Explicit access key override.
    #[serde(default, alias = "access_key")]
    pub access_key_id: Option<String>,

    /// Explicit secret key override.
    #[serde(default, alias = "secret_key")]
    pub secret_access_key: Option<String>,

    /// Explicit S3-compatible endpoint override (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Explicit path-style addressing override. Only applied when an
    /// endpoint is configured.
    #[serde(default)]
    pub use_path_style: Option<bool>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            profiles: HashMap::new(),
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            use_path_style: None,
        }
    }
}

/// A named set of store connection parameters.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageProfile {
    /// Bucket name.
    #[serde(default)]
    pub bucket: Option<String>,

    /// AWS region.
    #[serde(default)]
    pub region: Option<String>,

    /// Access key.
    #[serde(default, alias = "access_key")]
    pub access_key_id: Option<String>,

    /// Secret key.
    #[serde(default, alias = "secret_key")]
    pub secret_access_key: Option<String>,

    /// Custom S3-compatible endpoint.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Force path-style URL addressing.
    #[serde(default)]
    pub use_path_style: Option<bool>,
}

/// Upload key generation and presigning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Key prefix for uploaded objects.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Presigned-URL lifetime in seconds.
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            presign_expiry_secs: default_presign_expiry(),
        }
    }
}

/// Route exposure configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutesConfig {
    /// Whether the upload API routes are mounted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path prefix the four upload routes are nested under.
    #[serde(default = "default_route_prefix")]
    pub prefix: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_route_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
///
/// Controls Prometheus metrics collection and the `/health` probe.
/// Both are enabled by default.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,

    /// Enable the `/health` probe.
    #[serde(default = "default_true")]
    pub health_check: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics: true,
            health_check: true,
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9440
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_key_prefix() -> String {
    "uploads/multipart".to_string()
}

fn default_presign_expiry() -> u64 {
    3600 // 60 minutes
}

fn default_route_prefix() -> String {
    "/api/s3/multipart".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    Ok(config)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.server.port, 9440);
        assert_eq!(config.storage.profile, "default");
        assert_eq!(config.upload.key_prefix, "uploads/multipart");
        assert_eq!(config.upload.presign_expiry_secs, 3600);
        assert!(config.routes.enabled);
        assert_eq!(config.routes.prefix, "/api/s3/multipart");
        assert!(config.observability.metrics);
    }

    #[test]
    fn test_profile_and_overrides_parse() {
        let yaml = r#"
storage:
  profile: minio
  bucket: override-bucket
  profiles:
    minio:
      bucket: profile-bucket
      region: eu-west-1
      access_key: AK
      secret_key: SK
      endpoint_url: http://localhost:9000
      use_path_style: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.profile, "minio");
        assert_eq!(config.storage.bucket.as_deref(), Some("override-bucket"));
        let profile = &config.storage.profiles["minio"];
        assert_eq!(profile.bucket.as_deref(), Some("profile-bucket"));
        assert_eq!(profile.access_key_id.as_deref(), Some("AK"));
        assert_eq!(profile.use_path_style, Some(true));
    }

    #[test]
    fn test_upload_section_overrides() {
        let yaml = r#"
upload:
  key_prefix: incoming/blobs
  presign_expiry_secs: 900
routes:
  enabled: false
  prefix: /uploads
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.upload.key_prefix, "incoming/blobs");
        assert_eq!(config.upload.presign_expiry_secs, 900);
        assert!(!config.routes.enabled);
        assert_eq!(config.routes.prefix, "/uploads");
    }
}
