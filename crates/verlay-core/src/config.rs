//! Global and per-project version configuration.
//!
//! A missing file is "tier inapplicable" (`Ok(None)` / empty config), never
//! an error; only unreadable or unparseable files are real failures.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

pub const PROJECT_FILE: &str = "verlay.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot serialize config")]
    Serialize(#[from] toml::ser::Error),
}

/// Process-wide defaults plus the user alias table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub tools: BTreeMap<String, String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Structured project config found at one directory level.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// The file the mapping came from.
    pub path: PathBuf,
    pub tools: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Project(PathBuf),
}

pub trait ConfigStore: Send + Sync {
    fn load_global(&self) -> Result<GlobalConfig, ConfigError>;

    /// Structured project config at exactly `dir` (no ancestor walk here;
    /// the resolver owns the walk).
    fn load_project(&self, dir: &Path) -> Result<Option<ProjectConfig>, ConfigError>;

    fn set_tool_version(
        &self,
        tool: &str,
        version: &str,
        scope: ConfigScope,
    ) -> Result<(), ConfigError>;

    /// Where the global mapping is persisted, when it is a file.
    fn global_path(&self) -> Option<PathBuf> {
        None
    }

    /// Project-then-global convenience lookup.
    fn effective_version(&self, tool: &str, dir: &Path) -> Result<Option<String>, ConfigError> {
        for level in dir.ancestors() {
            if let Some(project) = self.load_project(level)? {
                if let Some(version) = project.tools.get(tool) {
                    return Ok(Some(version.clone()));
                }
            }
        }
        Ok(self.load_global()?.tools.get(tool).cloned())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    tools: BTreeMap<String, String>,
}

/// TOML-backed store: one global file, one `verlay.toml` per project.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    global: PathBuf,
}

impl TomlConfigStore {
    pub fn new(global: impl Into<PathBuf>) -> Self {
        TomlConfigStore {
            global: global.into(),
        }
    }

    fn read_toml<T: Default + for<'de> Deserialize<'de>>(
        path: &Path,
    ) -> Result<Option<T>, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        toml::from_str(&text)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    // Write-then-rename so a crashed writer never leaves a torn file.
    fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(value)?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let staged = path.with_extension("toml.tmp");
        std::fs::write(&staged, text).map_err(io_err)?;
        std::fs::rename(&staged, path).map_err(io_err)
    }
}

impl ConfigStore for TomlConfigStore {
    fn load_global(&self) -> Result<GlobalConfig, ConfigError> {
        Ok(Self::read_toml(&self.global)?.unwrap_or_default())
    }

    fn load_project(&self, dir: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
        let path = dir.join(PROJECT_FILE);
        Ok(
            Self::read_toml::<ProjectFile>(&path)?.map(|file| ProjectConfig {
                path,
                tools: file.tools,
            }),
        )
    }

    fn set_tool_version(
        &self,
        tool: &str,
        version: &str,
        scope: ConfigScope,
    ) -> Result<(), ConfigError> {
        match scope {
            ConfigScope::Global => {
                let mut config = self.load_global()?;
                config.tools.insert(tool.to_string(), version.to_string());
                Self::write_toml(&self.global, &config)
            }
            ConfigScope::Project(dir) => {
                let path = dir.join(PROJECT_FILE);
                let mut file = Self::read_toml::<ProjectFile>(&path)?.unwrap_or_default();
                file.tools.insert(tool.to_string(), version.to_string());
                Self::write_toml(&path, &file)
            }
        }
    }

    fn global_path(&self) -> Option<PathBuf> {
        Some(self.global.clone())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    global: RwLock<GlobalConfig>,
    projects: RwLock<HashMap<PathBuf, BTreeMap<String, String>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global(&self, tool: &str, version: &str) {
        self.global
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .tools
            .insert(tool.to_string(), version.to_string());
    }

    pub fn set_alias(&self, name: &str, target: &str) {
        self.global
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .aliases
            .insert(name.to_string(), target.to_string());
    }

    pub fn set_project(&self, dir: impl Into<PathBuf>, tool: &str, version: &str) {
        self.projects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dir.into())
            .or_default()
            .insert(tool.to_string(), version.to_string());
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_global(&self) -> Result<GlobalConfig, ConfigError> {
        Ok(self
            .global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn load_project(&self, dir: &Path) -> Result<Option<ProjectConfig>, ConfigError> {
        Ok(self
            .projects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dir)
            .map(|tools| ProjectConfig {
                path: dir.join(PROJECT_FILE),
                tools: tools.clone(),
            }))
    }

    fn set_tool_version(
        &self,
        tool: &str,
        version: &str,
        scope: ConfigScope,
    ) -> Result<(), ConfigError> {
        match scope {
            ConfigScope::Global => self.set_global(tool, version),
            ConfigScope::Project(dir) => self.set_project(dir, tool, version),
        }
        Ok(())
    }
}
