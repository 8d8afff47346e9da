use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::{AssistantError, Result};

use super::config::ProviderAuth;
use super::env::Env;

/// Variable consulted when an env-based auth lists no keys of its own.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// A resolved credential, sent as one header on every request.
#[derive(Clone)]
pub(crate) struct AuthHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

impl AuthHeader {
    pub(crate) fn bearer(api_key: &str) -> Result<Self> {
        Self::new(AUTHORIZATION, &format!("Bearer {api_key}"))
    }

    fn new(name: HeaderName, value: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(value).map_err(|err| {
            AssistantError::Auth(format!("api key is not a valid {name} header value: {err}"))
        })?;
        value.set_sensitive(true);
        Ok(Self { name, value })
    }

    pub(crate) fn name(&self) -> &HeaderName {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn value(&self) -> &HeaderValue {
        &self.value
    }

    pub(crate) fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(self.name.clone(), self.value.clone())
    }
}

impl ProviderAuth {
    /// Resolves the api key this auth points at.
    ///
    /// Env-based variants try their keys in order, or `OPENAI_API_KEY` when
    /// none are listed. A command may print either the bare key or a JSON
    /// object with `api_key` or `token`.
    pub async fn resolve_api_key(&self, env: &Env) -> Result<String> {
        match self {
            Self::ApiKeyEnv { keys } | Self::HttpHeaderEnv { keys, .. } => {
                api_key_from_env(env, keys)
            }
            Self::Command { command } => api_key_from_command(command).await,
        }
    }

    pub(crate) async fn resolve_header(&self, env: &Env) -> Result<AuthHeader> {
        let api_key = self.resolve_api_key(env).await?;
        match self {
            Self::HttpHeaderEnv { header, prefix, .. } => {
                let name = HeaderName::from_bytes(header.trim().as_bytes()).map_err(|err| {
                    AssistantError::Config(format!("invalid auth header name {header:?}: {err}"))
                })?;
                let prefix = prefix.as_deref().unwrap_or_default();
                AuthHeader::new(name, &format!("{prefix}{api_key}"))
            }
            Self::ApiKeyEnv { .. } | Self::Command { .. } => AuthHeader::bearer(&api_key),
        }
    }
}

fn api_key_from_env(env: &Env, keys: &[String]) -> Result<String> {
    let tried: Vec<&str> = if keys.is_empty() {
        vec![OPENAI_API_KEY]
    } else {
        keys.iter().map(String::as_str).collect()
    };
    tried
        .iter()
        .find_map(|key| env.get(key))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| {
            AssistantError::Auth(format!("no api key set (tried: {})", tried.join(", ")))
        })
}

#[derive(Deserialize)]
struct CommandOutput {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

async fn api_key_from_command(command: &[String]) -> Result<String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| AssistantError::Auth("auth command is empty".to_string()))?;
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|err| AssistantError::Auth(format!("failed to run {program}: {err}")))?;
    if !output.status.success() {
        return Err(AssistantError::Auth(format!(
            "{program} exited with {}",
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    let api_key = if stdout.starts_with('{') {
        let parsed: CommandOutput = serde_json::from_str(stdout)?;
        parsed.api_key.or(parsed.token).unwrap_or_default()
    } else {
        stdout.to_string()
    };

    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AssistantError::Auth(format!("{program} printed no api key")));
    }
    Ok(api_key.to_string())
}
