//! Content fingerprints used to detect file modification.

use crate::error::{ConfigError, Result};
use std::path::Path;

/// Compute the fingerprint of a file's full contents.
///
/// The fingerprint is the hex-encoded 128-bit MD5 digest of the bytes. It only
/// answers "did the bytes change" and is not an integrity guarantee.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example() -> confmon::error::Result<()> {
/// let digest = confmon::monitor::fingerprint("config/app.yaml").await?;
/// assert_eq!(digest.len(), 32);
/// # Ok(())
/// # }
/// ```
pub async fn fingerprint(path: impl AsRef<Path>) -> Result<String> {
    let bytes = read_file(path.as_ref()).await?;
    Ok(fingerprint_bytes(&bytes))
}

/// Fingerprint of an in-memory buffer.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::io(path, e))
}

/// Replace a file's contents in one step.
///
/// The bytes go to a hidden sibling file that is then renamed over `path`, so
/// a concurrent read sees either the old or the new content, never a prefix.
pub(crate) async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&staging, bytes)
        .await
        .map_err(|e| ConfigError::io(&staging, e))?;
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(ConfigError::io(path, e));
    }
    Ok(())
}
