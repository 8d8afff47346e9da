use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;

/// Variables from a `.env` file, layered over the process environment.
#[derive(Clone, Default)]
pub struct Env {
    overlay: BTreeMap<String, String>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.overlay.keys()).finish()
    }
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(contents: &str) -> Self {
        Self {
            overlay: parse_dotenv(contents),
        }
    }

    /// Reads a `.env` file. A missing file gives an empty overlay.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        match tokio::fs::read_to_string(path.as_ref()).await {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overlay.insert(key.into(), value.into());
    }

    /// Overlay first, then the process environment. Blank values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        self.overlay
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }
}

/// Parses `KEY=value` lines. Supports `export`, `#` comments and single or
/// double quotes; entries with blank values are dropped.
pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    contents.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    let value = unquote(raw.trim());
    if key.is_empty() || value.trim().is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn unquote(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    match raw.split_once(" #") {
        Some((value, _comment)) => value.trim_end(),
        None => raw,
    }
}
