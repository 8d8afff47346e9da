//! Helpers shared by unit and integration tests.

use std::path::{Path, PathBuf};

/// True when mock-server tests cannot run here: the sandbox forbids binding
/// localhost, or `ASSISTANT_SKIP_HTTPMOCK` is set.
pub fn should_skip_httpmock() -> bool {
    if std::env::var_os("ASSISTANT_SKIP_HTTPMOCK").is_some() {
        eprintln!("skipping httpmock test: ASSISTANT_SKIP_HTTPMOCK is set");
        return true;
    }
    if can_bind_localhost() {
        return false;
    }
    eprintln!("skipping httpmock test: sandbox forbids binding to localhost");
    true
}

fn can_bind_localhost() -> bool {
    match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => false,
        Err(err) => panic!("failed to bind localhost for httpmock tests: {err}"),
    }
}

/// Writes `contents` to `dir/name` and returns the path.
pub async fn write_fixture(
    dir: &Path,
    name: &str,
    contents: impl AsRef<[u8]>,
) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}
