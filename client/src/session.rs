/// Session persistence — bearer token and cached identity in `session.json`
///
/// The file is re-read on every access so a token rotated by another
/// process (CLI login while the chat UI is open) is picked up by the next
/// request without any in-memory propagation.
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";

/// The logged-in user as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFileV1 {
    version: u8,
    token: String,
    #[serde(default)]
    user: Option<SessionUser>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    /// Current bearer token, read fresh from disk. `None` when logged out.
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.read()?.map(|s| s.token))
    }

    /// Token required for an authorized call; fails fast before any
    /// network attempt when the session is missing.
    pub fn require_token(&self) -> Result<String> {
        self.token()?
            .ok_or_else(|| ClientError::Auth("Not logged in".to_string()))
    }

    /// Cached identity from the last login, if any.
    pub fn user(&self) -> Result<Option<SessionUser>> {
        Ok(self.read()?.and_then(|s| s.user))
    }

    pub fn save(&self, token: &str, user: Option<SessionUser>) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(ClientError::Io)?;
        let file = SessionFileV1 {
            version: 1,
            token: token.to_string(),
            user,
        };
        let json = serde_json::to_string_pretty(&file).map_err(ClientError::Serialization)?;
        fs::write(self.path(), json).map_err(ClientError::Io)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path).map_err(ClientError::Io)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<Option<SessionFileV1>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(ClientError::Io)?;
        let parsed: SessionFileV1 =
            serde_json::from_str(&raw).map_err(ClientError::Serialization)?;
        if parsed.version != 1 {
            return Err(ClientError::Config(format!(
                "Unsupported session file version: {}",
                parsed.version
            )));
        }
        Ok(Some(parsed))
    }
}
