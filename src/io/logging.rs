use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "tb.log";

/// Filter directive: `TB_LOG`, then the config's `[log] level`, then `warn`
pub fn log_filter(config_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env("TB_LOG")
        .or_else(|_| EnvFilter::try_new(config_level.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr (command-line use). Safe to call more than once.
pub fn init_stderr(config_level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(config_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to `.taskboard/tb.log` so the terminal UI is not drawn over
pub fn init_file(board_dir: &Path, config_level: Option<&str>) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(board_dir.join(LOG_FILE))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(config_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
