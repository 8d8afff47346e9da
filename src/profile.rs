mod auth;
mod config;
mod env;

pub(crate) use auth::AuthHeader;
pub use auth::OPENAI_API_KEY;
pub use config::{AssistantSettings, Config, FilesConfig, ProviderAuth, ProviderConfig};
pub use env::{Env, parse_dotenv};

#[cfg(test)]
mod tests;
