/// Gateway Configuration
///
/// Loads all runtime settings from environment variables once at startup.
/// The resulting `Settings` value is immutable and is passed by value into
/// the gateway state; nothing re-reads the environment after boot.
///
/// Environment Variables:
/// - OPENAI_API_KEY: Upstream API key (required, must look well-formed)
/// - OPENAI_BASE_URL: Upstream base URL (default: https://api.openai.com/v1)
/// - DEFAULT_MODEL: Model used when a request names none (default: gpt-4.1-mini)
/// - APP_PUBLIC_URL: Public URL sent as the HTTP-Referer attribution header
/// - APP_TITLE: Title sent as the X-Title attribution header
/// - INCLUDE_REASONING: Pass extended reasoning through on the plain chat path
/// - FILES_BASE_DIR: Base directory for the read_file tool (default: /app)
/// - HOST, PORT: HTTP bind address (default: 0.0.0.0:8000)
/// - MCP_TRANSPORT_MODE: "http", "stdio", or "both" (default: "http")

use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_APP_TITLE: &str = "mcp-router";
const DEFAULT_FILES_BASE_DIR: &str = "/app";

/// Configuration load failure. Fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} looks malformed")]
    Malformed(&'static str),
}

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Upstream API key. Sent as a bearer token on every upstream call.
    pub api_key: String,
    /// Upstream base URL, e.g. https://api.openai.com/v1 or an OpenRouter URL.
    pub base_url: String,
    /// Model used when a chat request does not name one.
    pub default_model: String,
    /// Optional public URL for the HTTP-Referer attribution header.
    pub app_public_url: Option<String>,
    /// Title for the X-Title attribution header.
    pub app_title: String,
    /// When set, forwarded as include_reasoning on plain chat completions.
    pub include_reasoning: Option<bool>,
    /// Base directory the read_file tool is confined to.
    pub files_base_dir: PathBuf,
    /// HTTP bind address.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// Transport mode: "http", "stdio", or "both".
    pub transport: String,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings from an arbitrary lookup. `from_env` passes the process
    /// environment; tests pass a closure over a map.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        // Not a strict check, but catches truncated or placeholder keys early.
        if api_key.trim().len() < 20 {
            return Err(ConfigError::Malformed("OPENAI_API_KEY"));
        }

        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Malformed("OPENAI_BASE_URL"));
        }

        let default_model = get("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let app_public_url = get("APP_PUBLIC_URL").filter(|url| !url.is_empty());
        let app_title = get("APP_TITLE")
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_APP_TITLE.to_string());

        let include_reasoning = get("INCLUDE_REASONING").and_then(|raw| parse_bool(&raw));

        let files_base_dir = get("FILES_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILES_BASE_DIR));

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = get("PORT")
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(8000);
        let transport = get("MCP_TRANSPORT_MODE").unwrap_or_else(|| "http".to_string());

        Ok(Settings {
            api_key,
            base_url,
            default_model,
            app_public_url,
            app_title,
            include_reasoning,
            files_base_dir,
            host,
            port,
            transport,
        })
    }
}

/// Accepts "true"/"1" and "false"/"0" (case-insensitive); anything else is unset.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
