use directories::BaseDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::backend::Backend;
use crate::error::{ClientError, Result};
use crate::storage::SessionStore;
use crate::ui::login::show_login_window;
use crate::ui::main_window::{show_main_window, Exit};
use crate::ui::Console;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub get_retries: u32,
    pub default_profile_photo: String,
    pub session_db: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 10,
            get_retries: 1,
            default_profile_photo: "default-avatar.png".to_string(),
            session_db: None,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("carrier").join("carrier.toml"))
    }

    /// Reads the config at `path` (or the default location). A missing file
    /// yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str::<AppConfig>(&text)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))?;
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn session_store(&self) -> Result<SessionStore> {
        match &self.session_db {
            Some(path) => SessionStore::open(path.clone()),
            None => SessionStore::open_default(),
        }
    }
}

/// Opens the messaging view directly when a session is already stored,
/// otherwise starts at the landing page.
pub async fn run(config: AppConfig, store: SessionStore, backend: Arc<dyn Backend>) -> Result<()> {
    let mut console = Console::new();
    let mut stored = store.get()?;
    loop {
        let session = match stored.take() {
            Some(session) => {
                info!("resuming session for {}", session.username);
                backend.set_token(session.token.clone());
                session
            }
            None => match show_login_window(&mut console, backend.as_ref(), &store).await? {
                Some(session) => session,
                None => return Ok(()),
            },
        };
        let next = show_main_window(&mut console, &config, &store, backend.clone(), session).await?;
        if next == Exit::Quit {
            return Ok(());
        }
    }
}
