use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::Result;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Streams the file through SHA-256 and returns the lowercase hex digest.
pub async fn calculate_file_hash(path: impl AsRef<Path>) -> Result<String> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compares the file's current digest against `last_hash`.
///
/// `None` or a blank hash means the file was never seen, so it always counts
/// as changed. Returns the freshly computed digest either way.
pub async fn has_file_changed(
    path: impl AsRef<Path>,
    last_hash: Option<&str>,
) -> Result<(bool, String)> {
    let current = calculate_file_hash(path).await?;
    let changed = match last_hash.map(str::trim).filter(|hash| !hash.is_empty()) {
        Some(last) => !last.eq_ignore_ascii_case(&current),
        None => true,
    };
    Ok((changed, current))
}
