//! Layered resolution of the context directory
//!
//! Sources are consulted in a fixed order and the first one that yields a
//! non-empty directory wins:
//!
//! ```text
//! --dir flag > RLM_CONTEXT_DIR > workspace config > global config > default
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::store::{ConfigStore, global_config_path, workspace_config_path};
use crate::error::{Result, RlmError};

/// Environment variable that overrides configured context directories
pub const CONTEXT_DIR_ENV: &str = "RLM_CONTEXT_DIR";

/// Name of the default context directory under the workspace root
pub const DEFAULT_CONTEXT_DIR_NAME: &str = "large context files";

/// Which source supplied the effective context directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Flag,
    Env,
    Workspace,
    Global,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => write!(f, "flag"),
            Self::Env => write!(f, "env"),
            Self::Workspace => write!(f, "workspace"),
            Self::Global => write!(f, "global"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Outcome of a resolution, with provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub workspace_root: PathBuf,
    /// Written as `""` when there is no config home
    #[serde(serialize_with = "serialize_optional_path")]
    pub global_config_path: Option<PathBuf>,
    pub workspace_config_path: PathBuf,
    pub context_dir: PathBuf,
    pub source: ConfigSource,
}

fn serialize_optional_path<S: Serializer>(path: &Option<PathBuf>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match path {
        Some(path) => path.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

/// One link of the precedence chain
///
/// Providers are evaluated lazily, so a config file is never read once an
/// earlier source has produced a value.
pub trait ContextDirProvider {
    /// Tag reported when this provider wins
    fn source(&self) -> ConfigSource;

    /// The directory this source offers, if any
    fn context_dir(&self) -> Option<PathBuf>;
}

/// A provider whose value is already known (flag, environment)
#[derive(Debug, Clone)]
pub struct FixedProvider {
    source: ConfigSource,
    value: Option<PathBuf>,
}

impl FixedProvider {
    pub fn new(source: ConfigSource, value: Option<PathBuf>) -> Self {
        Self { source, value }
    }
}

impl ContextDirProvider for FixedProvider {
    fn source(&self) -> ConfigSource {
        self.source
    }

    fn context_dir(&self) -> Option<PathBuf> {
        self.value.clone()
    }
}

/// A provider backed by a config document on disk
#[derive(Debug, Clone)]
pub struct ConfigFileProvider {
    source: ConfigSource,
    store: Option<ConfigStore>,
}

impl ConfigFileProvider {
    pub fn new(source: ConfigSource, path: Option<PathBuf>) -> Self {
        Self {
            source,
            store: path.map(ConfigStore::new),
        }
    }
}

impl ContextDirProvider for ConfigFileProvider {
    fn source(&self) -> ConfigSource {
        self.source
    }

    fn context_dir(&self) -> Option<PathBuf> {
        let config = self.store.as_ref()?.read()?;
        config.context_dir().map(Path::to_path_buf)
    }
}

/// Pick the first provider yielding a non-empty directory
pub fn select_context_dir(providers: &[&dyn ContextDirProvider]) -> Option<(PathBuf, ConfigSource)> {
    providers.iter().find_map(|provider| {
        let dir = provider.context_dir().filter(|d| !d.as_os_str().is_empty())?;
        debug!(source = %provider.source(), dir = %dir.display(), "select_context_dir: source supplied a value");
        Some((dir, provider.source()))
    })
}

/// Default context directory for a workspace
pub fn default_context_dir(workspace_root: &Path) -> PathBuf {
    workspace_root.join(DEFAULT_CONTEXT_DIR_NAME)
}

/// Resolves the effective context directory for a workspace
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    global_config_path: Option<PathBuf>,
    env_context_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(global_config_path: Option<PathBuf>, env_context_dir: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            env_context_dir,
        }
    }

    /// Build a resolver from the process environment and the user's config home
    pub fn from_env() -> Self {
        let env_context_dir = std::env::var_os(CONTEXT_DIR_ENV).map(PathBuf::from);
        debug!(?env_context_dir, "ConfigResolver::from_env: called");
        Self::new(global_config_path(), env_context_dir)
    }

    /// Resolve the context directory for `workspace_root`
    pub fn resolve(&self, workspace_root: &Path, dir_override: Option<&Path>) -> Result<ResolvedConfig> {
        debug!(workspace_root = %workspace_root.display(), ?dir_override, "ConfigResolver::resolve: called");
        if workspace_root.as_os_str().is_empty() {
            return Err(RlmError::MissingWorkspaceRoot);
        }

        let workspace_config_path = workspace_config_path(workspace_root);

        let flag = FixedProvider::new(ConfigSource::Flag, dir_override.map(Path::to_path_buf));
        let env = FixedProvider::new(ConfigSource::Env, self.env_context_dir.clone());
        let workspace = ConfigFileProvider::new(ConfigSource::Workspace, Some(workspace_config_path.clone()));
        let global = ConfigFileProvider::new(ConfigSource::Global, self.global_config_path.clone());

        let (context_dir, source) = select_context_dir(&[&flag, &env, &workspace, &global])
            .unwrap_or_else(|| (default_context_dir(workspace_root), ConfigSource::Default));

        info!(context_dir = %context_dir.display(), %source, "Resolved context directory");
        Ok(ResolvedConfig {
            workspace_root: workspace_root.to_path_buf(),
            global_config_path: self.global_config_path.clone(),
            workspace_config_path,
            context_dir,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use serial_test::serial;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        workspace: PathBuf,
        global_path: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let workspace = temp.path().join("ws");
            std::fs::create_dir_all(&workspace).unwrap();
            let global_path = temp.path().join("config-home").join("rlm").join("config.json");
            Self {
                _temp: temp,
                workspace,
                global_path,
            }
        }

        fn write_workspace(&self, dir: &str) {
            ConfigStore::new(workspace_config_path(&self.workspace))
                .write(&ContextConfig::new(dir))
                .unwrap();
        }

        fn write_global(&self, dir: &str) {
            ConfigStore::new(&self.global_path)
                .write(&ContextConfig::new(dir))
                .unwrap();
        }

        fn resolver(&self, env: Option<&str>) -> ConfigResolver {
            ConfigResolver::new(Some(self.global_path.clone()), env.map(PathBuf::from))
        }
    }

    #[test]
    fn test_workspace_over_global() {
        let fx = Fixture::new();
        fx.write_global("/global/ctx");
        fx.write_workspace("/workspace/ctx");

        let resolved = fx.resolver(None).resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.context_dir, PathBuf::from("/workspace/ctx"));
        assert_eq!(resolved.source, ConfigSource::Workspace);
    }

    #[test]
    fn test_flag_beats_everything() {
        let fx = Fixture::new();
        fx.write_global("/global/ctx");
        fx.write_workspace("/workspace/ctx");

        let resolved = fx
            .resolver(Some("/env/ctx"))
            .resolve(&fx.workspace, Some(Path::new("/flag/ctx")))
            .unwrap();
        assert_eq!(resolved.context_dir, PathBuf::from("/flag/ctx"));
        assert_eq!(resolved.source, ConfigSource::Flag);
    }

    #[test]
    fn test_env_beats_config_files() {
        let fx = Fixture::new();
        fx.write_global("/global/ctx");
        fx.write_workspace("/workspace/ctx");

        let resolved = fx.resolver(Some("/env/ctx")).resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.context_dir, PathBuf::from("/env/ctx"));
        assert_eq!(resolved.source, ConfigSource::Env);
    }

    #[test]
    fn test_global_when_no_workspace_config() {
        let fx = Fixture::new();
        fx.write_global("/global/ctx");

        let resolved = fx.resolver(None).resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.context_dir, PathBuf::from("/global/ctx"));
        assert_eq!(resolved.source, ConfigSource::Global);
    }

    #[test]
    fn test_default_when_nothing_configured() {
        let fx = Fixture::new();

        let resolved = fx.resolver(None).resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.context_dir, fx.workspace.join("large context files"));
        assert_eq!(resolved.source, ConfigSource::Default);
        assert_eq!(resolved.workspace_config_path, fx.workspace.join(".rlm").join("config.json"));
        assert_eq!(resolved.global_config_path, Some(fx.global_path.clone()));
    }

    #[test]
    fn test_empty_values_fall_through() {
        let fx = Fixture::new();
        fx.write_workspace("");
        fx.write_global("/global/ctx");

        let resolved = fx
            .resolver(Some(""))
            .resolve(&fx.workspace, Some(Path::new("")))
            .unwrap();
        assert_eq!(resolved.source, ConfigSource::Global);
    }

    #[test]
    fn test_malformed_workspace_config_falls_through() {
        let fx = Fixture::new();
        let path = workspace_config_path(&fx.workspace);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"context_dir\": ").unwrap();
        fx.write_global("/global/ctx");

        let resolved = fx.resolver(None).resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.source, ConfigSource::Global);
    }

    #[test]
    fn test_no_global_config_home() {
        let fx = Fixture::new();
        let resolver = ConfigResolver::new(None, None);

        let resolved = resolver.resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.source, ConfigSource::Default);
        assert!(resolved.global_config_path.is_none());

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["global_config_path"], "");
        assert_eq!(json["source"], "default");
    }

    #[test]
    fn test_global_config_path_serialized() {
        let fx = Fixture::new();

        let resolved = fx.resolver(None).resolve(&fx.workspace, None).unwrap();
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["global_config_path"], fx.global_path.display().to_string());
    }

    #[test]
    fn test_missing_workspace_root() {
        let err = ConfigResolver::default().resolve(Path::new(""), None).unwrap_err();
        assert!(matches!(err, RlmError::MissingWorkspaceRoot));
    }

    struct CountingProvider {
        source: ConfigSource,
        value: Option<PathBuf>,
        calls: Cell<usize>,
    }

    impl ContextDirProvider for CountingProvider {
        fn source(&self) -> ConfigSource {
            self.source
        }

        fn context_dir(&self) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            self.value.clone()
        }
    }

    #[test]
    fn test_select_stops_at_first_value() {
        let first = CountingProvider {
            source: ConfigSource::Env,
            value: None,
            calls: Cell::new(0),
        };
        let second = CountingProvider {
            source: ConfigSource::Workspace,
            value: Some(PathBuf::from("/ws")),
            calls: Cell::new(0),
        };
        let third = CountingProvider {
            source: ConfigSource::Global,
            value: Some(PathBuf::from("/global")),
            calls: Cell::new(0),
        };

        let selected = select_context_dir(&[&first, &second, &third]);
        assert_eq!(selected, Some((PathBuf::from("/ws"), ConfigSource::Workspace)));
        assert_eq!(first.calls.get(), 1);
        assert_eq!(second.calls.get(), 1);
        assert_eq!(third.calls.get(), 0);
    }

    #[test]
    fn test_select_nothing() {
        let none = FixedProvider::new(ConfigSource::Flag, None);
        assert!(select_context_dir(&[&none]).is_none());
        assert!(select_context_dir(&[]).is_none());
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let json = serde_json::to_string(&ConfigSource::Workspace).unwrap();
        assert_eq!(json, "\"workspace\"");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_override() {
        // SAFETY: serialized with the other environment tests
        unsafe {
            std::env::set_var(CONTEXT_DIR_ENV, "/from/env");
        }

        let resolver = ConfigResolver::from_env();

        // SAFETY: serialized with the other environment tests
        unsafe {
            std::env::remove_var(CONTEXT_DIR_ENV);
        }

        let fx = Fixture::new();
        let resolved = resolver.resolve(&fx.workspace, None).unwrap();
        assert_eq!(resolved.context_dir, PathBuf::from("/from/env"));
        assert_eq!(resolved.source, ConfigSource::Env);
    }
}
