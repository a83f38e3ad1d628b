use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::session::User;

/// What the CLI remembers between invocations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFile {
    /// API the session belongs to; falls back to `ADMIN_API_BASE_URL`
    pub base_url: Option<String>,
    /// Raw `Cookie` header replayed on every request
    pub cookie: Option<String>,
    pub user: Option<User>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl SessionFile {
    pub fn new(base_url: String, cookie: Option<String>, user: User) -> Self {
        Self { base_url: Some(base_url), cookie, user: Some(user), logged_in_at: Some(Utc::now()) }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("BACKOFFICE_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("backoffice").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_session() -> anyhow::Result<SessionFile> {
    let session_file = get_config_dir()?.join("session.json");

    if !session_file.exists() {
        return Ok(SessionFile::default());
    }

    let content = fs::read_to_string(session_file)?;
    let session: SessionFile = serde_json::from_str(&content)?;
    Ok(session)
}

pub fn save_session(session: &SessionFile) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");

    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_file, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join("session.json");
    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}
