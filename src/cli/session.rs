//! Persisted CLI session.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GatorError, Result};

/// Who is logged in between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name of the current user, if any.
    #[serde(default)]
    pub current_user_name: Option<String>,
}

impl Session {
    /// Load a session file. A missing file yields an empty session.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No session file at {:?}", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            GatorError::Config(format!("invalid session file {}: {}", path.display(), e))
        })
    }

    /// Write the session file, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GatorError::Config(format!("failed to encode session: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Set the current user.
    pub fn set_user(&mut self, name: impl Into<String>) {
        self.current_user_name = Some(name.into());
    }

    /// Forget the current user.
    pub fn clear(&mut self) {
        self.current_user_name = None;
    }
}
