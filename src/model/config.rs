use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from `.taskboard/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Which task API to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON file next to the config (`board.json`)
    #[default]
    Local,
    /// REST API at `base_url`
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            backend: Backend::default(),
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSection {
    /// Project whose board is shown when `--project` is not given
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Hex overrides for theme slots, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing filter directive, e.g. `info` or `taskboard=debug`
    #[serde(default)]
    pub level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: BoardConfig = toml::from_str("").unwrap();
        assert_eq!(config.remote.backend, Backend::Local);
        assert_eq!(config.remote.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(config.ui.show_key_hints);
        assert!(config.board.project.is_none());
    }

    #[test]
    fn http_backend() {
        let config: BoardConfig = toml::from_str(
            r#"[remote]
backend = "http"
base_url = "https://jira.example.com/api/v1"
token = "abc"

[board]
project = "p1"
"#,
        )
        .unwrap();
        assert_eq!(config.remote.backend, Backend::Http);
        assert_eq!(config.remote.token.as_deref(), Some("abc"));
        assert_eq!(config.board.project.as_deref(), Some("p1"));
    }
}
