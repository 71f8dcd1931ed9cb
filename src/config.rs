//! Footo configuration
//!
//! The module root is resolved once at startup and threaded explicitly into
//! every component, so resolution can be exercised against any directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::modules::error::{FootoError, SecurityError};
use crate::modules::permissions::restrict_to_owner;
use crate::modules::resolver::Scope;

pub const HOME_ENV_VAR: &str = "FOOTO_HOME";
pub const CONFIG_FILE: &str = "config.yaml";
pub const LOG_FILE: &str = "footo.log";
pub const DEFAULT_EDITOR_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FootoConfig {
    pub root: PathBuf,
    /// Render the reserved community scope in `list`
    pub include_community_in_list: bool,
    pub open_editor: bool,
    pub editor_timeout: Duration,
}

/// Optional overrides read from `<root>/config.yaml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    include_community_in_list: Option<bool>,
    open_editor: Option<bool>,
    editor_timeout_ms: Option<u64>,
}

impl FootoConfig {
    /// Configuration rooted at `root` with defaults for everything else
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_community_in_list: false,
            open_editor: true,
            editor_timeout: DEFAULT_EDITOR_TIMEOUT,
        }
    }

    /// Pick the root from an explicit override or fall back to `~/.footo`
    pub fn resolve_root(home_override: Option<PathBuf>) -> Result<PathBuf, FootoError> {
        if let Some(root) = home_override {
            return Ok(root);
        }
        dirs::home_dir()
            .map(|home| home.join(".footo"))
            .ok_or_else(|| FootoError::Initialization {
                path: PathBuf::from("~/.footo"),
                reason: "could not determine home directory".to_string(),
            })
    }

    /// Build a configuration for `root`, applying `config.yaml` if present
    pub fn load(root: PathBuf) -> Result<Self, FootoError> {
        let mut config = Self::with_root(root);
        let path = config.config_file();

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
            Err(e) => {
                return Err(FootoError::Initialization {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        let file: ConfigFile =
            serde_yaml::from_str(&content).map_err(|e| FootoError::Initialization {
                path: path.clone(),
                reason: format!("invalid configuration: {e}"),
            })?;

        if let Some(include) = file.include_community_in_list {
            config.include_community_in_list = include;
        }
        if let Some(open) = file.open_editor {
            config.open_editor = open;
        }
        if let Some(ms) = file.editor_timeout_ms {
            config.editor_timeout = Duration::from_millis(ms);
        }

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.root.join("modules")
    }

    pub fn scope_dir(&self, scope: Scope) -> PathBuf {
        self.modules_dir().join(scope.as_str())
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Ensure every scope directory exists as a real, owner-only directory.
    ///
    /// Check-then-create races against a concurrent invocation are tolerated:
    /// the loser's `create_dir_all` simply finds the directory already there.
    pub fn initialize_directories(&self) -> Result<(), FootoError> {
        for scope in Scope::ALL {
            let dir = self.scope_dir(scope);
            std::fs::create_dir_all(&dir).map_err(|e| FootoError::Initialization {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
            ensure_real_directory(&dir)?;
            restrict_to_owner(&dir, true);
        }

        info!("Initialized Footo directories at: {}", self.root.display());
        Ok(())
    }
}

fn ensure_real_directory(dir: &Path) -> Result<(), FootoError> {
    let metadata = std::fs::symlink_metadata(dir).map_err(|error| SecurityError::Io {
        path: dir.to_path_buf(),
        error,
    })?;

    if metadata.file_type().is_symlink() {
        return Err(SecurityError::Symlink {
            path: dir.to_path_buf(),
        }
        .into());
    }
    if !metadata.is_dir() {
        return Err(SecurityError::NotADirectory {
            path: dir.to_path_buf(),
        }
        .into());
    }
    Ok(())
}
