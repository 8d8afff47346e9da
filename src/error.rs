use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("not found: {body}")]
    NotFound { body: String },
    #[error("api error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to resolve api key: {0}")]
    Auth(String),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("failed to parse toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("file cache store error: {0}")]
    Store(String),
    #[error("no live assistant (create one or set an assistant id first)")]
    NoAssistant,
}

impl AssistantError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            Self::NotFound { body }
        } else {
            Self::Api { status, body }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
