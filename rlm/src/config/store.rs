//! Reading and writing the JSON configuration document

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, RlmError};

/// Directory under the workspace root that holds rlm state
pub const WORKSPACE_STATE_DIR: &str = ".rlm";

/// File name of both the global and the workspace config document
pub const CONFIG_FILE_NAME: &str = "config.json";

const APP_DIR: &str = "rlm";

/// The configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Directory containing large context files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_dir: Option<PathBuf>,
}

impl ContextConfig {
    pub fn new(context_dir: impl Into<PathBuf>) -> Self {
        Self {
            context_dir: Some(context_dir.into()),
        }
    }

    /// The configured directory, if present and non-empty
    pub fn context_dir(&self) -> Option<&Path> {
        self.context_dir.as_deref().filter(|d| !d.as_os_str().is_empty())
    }
}

/// A config document stored at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document.
    ///
    /// A missing or unparsable file yields `None`: callers treat it as "no value
    /// from this source" rather than as an error.
    pub fn read(&self) -> Option<ContextConfig> {
        debug!(path = %self.path.display(), "ConfigStore::read: called");
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(%e, "ConfigStore::read: not readable, treating as absent");
                return None;
            }
        };

        match serde_json::from_str::<ContextConfig>(&content) {
            Ok(config) => {
                debug!(?config, "ConfigStore::read: parsed");
                Some(config)
            }
            Err(e) => {
                debug!(%e, "ConfigStore::read: partial config, treating as absent");
                None
            }
        }
    }

    /// Write the document as two-space indented JSON with a trailing newline
    pub fn write(&self, config: &ContextConfig) -> Result<()> {
        debug!(path = %self.path.display(), ?config, "ConfigStore::write: called");
        if self.path.as_os_str().is_empty() {
            return Err(RlmError::InvalidArgument("config path is empty".to_string()));
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| RlmError::io(parent, e))?;
        }

        let mut content = serde_json::to_string_pretty(config)?;
        content.push('\n');
        fs::write(&self.path, content).map_err(|e| RlmError::io(&self.path, e))?;

        info!(path = %self.path.display(), "Wrote config");
        Ok(())
    }
}

/// Path of the user-wide config document, if a config home can be determined
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Path of the workspace-scoped config document
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WORKSPACE_STATE_DIR).join(CONFIG_FILE_NAME)
}
