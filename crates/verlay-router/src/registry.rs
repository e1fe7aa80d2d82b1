//! Process-scoped command registry and usage stats.

use crate::error::RouterError;
use crate::route::is_executable_file;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

/// One registered tool. Mutated after each execution; counters are
/// best-effort, not authoritative.
#[derive(Debug, Clone, Default)]
pub struct CommandInfo {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub usage_count: u64,
    pub last_used: Option<SystemTime>,
    /// Extra environment layered onto every invocation of this tool.
    pub env: BTreeMap<String, String>,
    pub aliases: Vec<String>,
}

impl CommandInfo {
    pub fn named(name: impl Into<String>) -> Self {
        CommandInfo {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    inner: RwLock<HashMap<String, CommandInfo>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command; a declared path must be a runnable executable.
    pub fn register(&self, info: CommandInfo) -> Result<(), RouterError> {
        if let Some(path) = &info.path {
            if !is_executable_file(path) {
                return Err(RouterError::InvalidExecutable {
                    name: info.name.clone(),
                    path: path.clone(),
                });
            }
        }
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.name.clone(), info);
        Ok(())
    }

    /// Unregistering an unknown name is an error.
    pub fn unregister(&self, name: &str) -> Result<CommandInfo, RouterError> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| RouterError::UnknownCommand(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<CommandInfo> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn env_overrides(&self, name: &str) -> BTreeMap<String, String> {
        self.get(name).map(|info| info.env).unwrap_or_default()
    }

    /// Bump usage after an attempt, registering the name if it is new.
    pub fn record_usage(&self, name: &str, version: &str, path: &Path) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let info = inner
            .entry(name.to_string())
            .or_insert_with(|| CommandInfo::named(name));
        info.usage_count += 1;
        info.last_used = Some(SystemTime::now());
        info.version = Some(version.to_string());
        info.path = Some(path.to_path_buf());
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
