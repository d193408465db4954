//! Object key generation.
//!
//! Keys have the shape `{prefix}/{token}-{file_name}` where `token` is a
//! 10-character alphanumeric string drawn from `rand::thread_rng()` (a
//! CSPRNG). 62^10 values make collisions between concurrent uploads of the
//! same filename negligible at any realistic call volume.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Length of the random token embedded in every generated key.
const TOKEN_LEN: usize = 10;

/// Produce a fresh object key for `file_name` under `prefix`.
///
/// `file_name` is embedded verbatim; callers are responsible for stripping
/// path separators first (see [`sanitize_file_name`]).
pub fn generate(prefix: &str, file_name: &str) -> String {
    let token: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{prefix}/{token}-{file_name}")
}

/// Reduce a client-supplied filename to its final path component.
///
/// Client filenames are attacker-controlled; without this step a name like
/// `../../etc/passwd` would be preserved verbatim into the object key and
/// escape the configured prefix. Returns `None` when nothing remains after
/// stripping.
pub fn sanitize_file_name(file_name: &str) -> Option<&str> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

// -- Tests --------------------------------------------------------------------
