use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable overriding the snapshot directory
pub const DATA_DIR_ENV: &str = "HACCP_CHAT_DIR";

const DEFAULT_DIR_NAME: &str = ".haccp-chat";

/// Get the snapshot directory: `$HACCP_CHAT_DIR` if set, else `~/.haccp-chat`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DEFAULT_DIR_NAME))
}
