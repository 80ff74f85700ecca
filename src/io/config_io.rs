use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{Backend, BoardConfig};

/// Directory holding the board's config, data file, lock, and log
pub const BOARD_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "config.toml";

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("not a taskboard directory: no .taskboard/ found (run `tb init`)")]
    NotABoard,
    #[error(".taskboard/ already exists in {0}")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

const CONFIG_TEMPLATE: &str = r##"[remote]
# "local" keeps the board in .taskboard/board.json
# "http" talks to the REST API at base_url
backend = "{backend}"
base_url = "{base_url}"
# token = ""
# timeout_secs = 30

[board]
{project_line}

[ui]
# show_key_hints = false
#
# [ui.colors]
# background = "#0C001B"
# text = "#A09BFE"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#5A5580"
# red = "#FF4444"
# yellow = "#FFD700"
# green = "#44FF88"
# cyan = "#44DDFF"

[log]
# level = "info"
"##;

/// Find the board root by walking up from `start`, looking for a
/// `.taskboard/` directory with a config file.
pub fn discover_board(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(BOARD_DIR);
        if dir.is_dir() && dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotABoard);
        }
    }
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(board_dir: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), ConfigError> {
    let path = board_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Read the config and apply environment overrides
pub fn load_config(board_dir: &Path) -> Result<BoardConfig, ConfigError> {
    let (mut config, _) = read_config(board_dir)?;
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// `TB_API_URL` points the board at a REST API (and selects the http
/// backend); `TB_TOKEN` replaces the bearer token.
pub fn apply_env(config: &mut BoardConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("TB_API_URL").filter(|v| !v.is_empty()) {
        config.remote.base_url = url;
        config.remote.backend = Backend::Http;
    }
    if let Some(token) = var("TB_TOKEN").filter(|v| !v.is_empty()) {
        config.remote.token = Some(token);
    }
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(board_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = board_dir.join(CONFIG_FILE);
    fs::write(&path, doc.to_string()).map_err(|e| ConfigError::ReadError { path, source: e })?;
    Ok(())
}

/// Set the default project in the config document
pub fn set_board_project(doc: &mut toml_edit::DocumentMut, project_id: &str) {
    if !doc.contains_key("board") {
        doc["board"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["board"]["project"] = toml_edit::value(project_id);
}

/// Set the bearer token in the config document
pub fn set_remote_token(doc: &mut toml_edit::DocumentMut, token: &str) {
    if !doc.contains_key("remote") {
        doc["remote"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["remote"]["token"] = toml_edit::value(token);
}

/// Clear the default project if it is `project_id`
pub fn clear_board_project(doc: &mut toml_edit::DocumentMut, project_id: &str) {
    let current = doc
        .get("board")
        .and_then(|b| b.get("project"))
        .and_then(|v| v.as_str());
    if current == Some(project_id)
        && let Some(board) = doc["board"].as_table_mut()
    {
        board.remove("project");
    }
}

/// Render a fresh config.toml
pub fn render_config(backend: Backend, base_url: &str, project: Option<&str>) -> String {
    let backend = match backend {
        Backend::Local => "local",
        Backend::Http => "http",
    };
    let project_line = match project {
        Some(id) => format!("project = \"{}\"", id),
        None => "# project = \"\"".to_string(),
    };
    CONFIG_TEMPLATE
        .replace("{backend}", backend)
        .replace("{base_url}", base_url)
        .replace("{project_line}", &project_line)
}

/// Create `.taskboard/` under `root` with the given config text.
/// Returns the board directory.
pub fn create_board_dir(root: &Path, config_text: &str) -> Result<PathBuf, ConfigError> {
    let dir = root.join(BOARD_DIR);
    if dir.join(CONFIG_FILE).exists() {
        return Err(ConfigError::AlreadyInitialized(root.to_path_buf()));
    }
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(CONFIG_FILE), config_text)?;
    Ok(dir)
}
