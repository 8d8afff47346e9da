use std::path::PathBuf;

use crate::assistant::AssistantTool;
use crate::{AssistantError, Result};

use super::*;

#[tokio::test]
async fn env_auth_tries_configured_keys_in_order() -> Result<()> {
    let mut env = Env::new();
    env.set("ASSISTANT_TEST_SECOND", " sk-second ");
    let auth = ProviderAuth::ApiKeyEnv {
        keys: vec![
            "ASSISTANT_TEST_FIRST_UNSET".to_string(),
            "ASSISTANT_TEST_SECOND".to_string(),
        ],
    };
    assert_eq!(auth.resolve_api_key(&env).await?, "sk-second");
    Ok(())
}

#[tokio::test]
async fn env_auth_without_keys_reads_openai_api_key() -> Result<()> {
    let env = Env::parse("OPENAI_API_KEY=sk-abc\n");
    let header = ProviderAuth::default().resolve_header(&env).await?;
    assert_eq!(header.name().as_str(), "authorization");
    assert_eq!(header.value().to_str().unwrap_or_default(), "Bearer sk-abc");
    Ok(())
}

#[tokio::test]
async fn missing_api_key_reports_tried_keys() {
    let auth = ProviderAuth::ApiKeyEnv {
        keys: vec!["ASSISTANT_TEST_DEFINITELY_UNSET".to_string()],
    };
    let err = auth
        .resolve_api_key(&Env::new())
        .await
        .expect_err("missing key should fail");
    match err {
        AssistantError::Auth(message) => {
            assert!(message.contains("ASSISTANT_TEST_DEFINITELY_UNSET"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn header_env_auth_uses_custom_header_and_prefix() -> Result<()> {
    let env = Env::parse("ASSISTANT_TEST_KEY=sk-test\n");
    let auth = ProviderAuth::HttpHeaderEnv {
        header: "api-key".to_string(),
        keys: vec!["ASSISTANT_TEST_KEY".to_string()],
        prefix: Some("Key ".to_string()),
    };
    let header = auth.resolve_header(&env).await?;
    assert_eq!(header.name().as_str(), "api-key");
    assert_eq!(header.value().to_str().unwrap_or_default(), "Key sk-test");
    assert!(header.value().is_sensitive());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn command_auth_reads_plain_or_json_output() -> Result<()> {
    let env = Env::new();
    let plain = ProviderAuth::Command {
        command: vec!["sh".to_string(), "-c".to_string(), "echo sk-plain".to_string()],
    };
    assert_eq!(plain.resolve_api_key(&env).await?, "sk-plain");

    let json = ProviderAuth::Command {
        command: vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"echo '{"token":"sk-json"}'"#.to_string(),
        ],
    };
    assert_eq!(json.resolve_api_key(&env).await?, "sk-json");

    let failing = ProviderAuth::Command {
        command: vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()],
    };
    let err = failing
        .resolve_api_key(&env)
        .await
        .expect_err("non-zero exit");
    assert!(matches!(err, AssistantError::Auth(_)));
    Ok(())
}

#[tokio::test]
async fn missing_dotenv_file_is_empty_overlay() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let env = Env::load(dir.path().join(".env")).await?;
    assert!(env.is_empty());

    let path = dir.path().join("present.env");
    tokio::fs::write(&path, "OPENAI_API_KEY='sk-file'\n").await?;
    let env = Env::load(&path).await?;
    assert_eq!(env.get("OPENAI_API_KEY").as_deref(), Some("sk-file"));
    Ok(())
}

#[test]
fn parses_dotenv_lines() {
    let parsed = parse_dotenv(
        r#"
# comment
export OPENAI_API_KEY="sk-test"
FOO=bar # trailing note
HASHED='a # b'
EMPTY=
=orphan
not a pair
"#,
    );
    assert_eq!(
        parsed.get("OPENAI_API_KEY").map(String::as_str),
        Some("sk-test")
    );
    assert_eq!(parsed.get("FOO").map(String::as_str), Some("bar"));
    assert_eq!(parsed.get("HASHED").map(String::as_str), Some("a # b"));
    assert_eq!(parsed.len(), 3);
}

#[test]
fn env_debug_lists_keys_only() {
    let env = Env::parse("OPENAI_API_KEY=sk-secret\n");
    let rendered = format!("{env:?}");
    assert!(rendered.contains("OPENAI_API_KEY"));
    assert!(!rendered.contains("sk-secret"));
}

#[test]
fn empty_config_uses_defaults() -> Result<()> {
    let config = Config::from_toml_str("")?;
    assert_eq!(config.assistant.model, "gpt-4o");
    assert_eq!(config.assistant.tools, vec![AssistantTool::CodeInterpreter]);
    assert_eq!(
        config.files.store_path,
        PathBuf::from("assistant_files.sqlite")
    );
    assert_eq!(config.files.purpose, "assistants");
    assert_eq!(config.provider.auth, None);
    Ok(())
}

#[test]
fn parses_full_config_from_toml() -> Result<()> {
    let config = Config::from_toml_str(
        r#"
[provider]
base_url = "https://example.com/v1"
organization = "org-1"
auth = { type = "api_key_env", keys = ["MY_KEY"] }

[provider.http_headers]
x-test = "1"

[assistant]
model = "gpt-4o-mini"
instructions = "Answer from the attached files."
tools = [{ type = "code_interpreter" }, { type = "file_search" }]

[files]
store_path = "cache/files.sqlite"
"#,
    )?;
    assert_eq!(
        config.provider.base_url.as_deref(),
        Some("https://example.com/v1")
    );
    assert_eq!(
        config.provider.auth,
        Some(ProviderAuth::ApiKeyEnv {
            keys: vec!["MY_KEY".to_string()]
        })
    );
    assert_eq!(
        config.provider.http_headers.get("x-test").map(String::as_str),
        Some("1")
    );
    assert_eq!(config.assistant.model, "gpt-4o-mini");
    assert_eq!(
        config.assistant.tools,
        vec![AssistantTool::CodeInterpreter, AssistantTool::FileSearch]
    );
    assert_eq!(config.files.store_path, PathBuf::from("cache/files.sqlite"));
    Ok(())
}

#[test]
fn rejects_blank_model() {
    let err = Config::from_toml_str("[assistant]\nmodel = \" \"\n").expect_err("blank model");
    assert!(matches!(err, AssistantError::Config(_)));
}

#[tokio::test]
async fn loads_config_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("assistant.toml");
    tokio::fs::write(&path, "[files]\npurpose = \"assistants\"\nstore_path = \"x.sqlite\"\n").await?;

    let config = Config::load(&path).await?;
    assert_eq!(config.files.store_path, PathBuf::from("x.sqlite"));

    let err = Config::load(dir.path().join("missing.toml"))
        .await
        .expect_err("missing config");
    assert!(matches!(err, AssistantError::Io(_)));
    Ok(())
}
