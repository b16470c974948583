//! Context directory configuration
//!
//! - [`store`] reads and writes the JSON document (`{"context_dir": ...}`)
//! - [`workspace`] finds the workspace root by walking up to a `.git` directory
//! - [`resolve`] applies the precedence chain and reports provenance

use std::path::{Path, PathBuf};

pub mod resolve;
pub mod store;
pub mod workspace;

pub use resolve::{
    CONTEXT_DIR_ENV, ConfigFileProvider, ConfigResolver, ConfigSource, ContextDirProvider, DEFAULT_CONTEXT_DIR_NAME,
    FixedProvider, ResolvedConfig, default_context_dir, select_context_dir,
};
pub use store::{
    CONFIG_FILE_NAME, ConfigStore, ContextConfig, WORKSPACE_STATE_DIR, global_config_path, workspace_config_path,
};
pub use workspace::{REPO_MARKER, detect_workspace_root};

/// Which config document `config set` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConfigScope {
    #[default]
    Workspace,
    Global,
}

impl ConfigScope {
    /// Location of this scope's document, if it can be determined
    pub fn config_path(self, workspace_root: &Path) -> Option<PathBuf> {
        match self {
            Self::Workspace => Some(workspace_config_path(workspace_root)),
            Self::Global => global_config_path(),
        }
    }
}
