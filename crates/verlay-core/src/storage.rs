//! Installed-version storage.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Where installed tool versions live.
///
/// Paths are stable per `(tool, version)` and presence reflects the actual
/// on-disk state; installation itself happens elsewhere.
pub trait VersionStorage: Send + Sync {
    fn tool_version_path(&self, tool: &str, version: &str) -> PathBuf;
    fn is_version_installed(&self, tool: &str, version: &str) -> bool;
    fn installed_versions(&self, tool: &str) -> Vec<String>;
    fn installed_tools(&self) -> Vec<String>;
}

/// Directory-backed storage: `<root>/<tool>/<version>`.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn subdirs(&self, dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

impl VersionStorage for DirStorage {
    fn tool_version_path(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version)
    }

    fn is_version_installed(&self, tool: &str, version: &str) -> bool {
        self.tool_version_path(tool, version).is_dir()
    }

    fn installed_versions(&self, tool: &str) -> Vec<String> {
        self.subdirs(&self.root.join(tool))
    }

    fn installed_tools(&self) -> Vec<String> {
        self.subdirs(&self.root)
    }
}

/// In-memory storage for tests: versions registered, not installed.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    root: PathBuf,
    tools: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl MemoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MemoryStorage {
            root: root.into(),
            tools: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn add(&self, tool: &str, version: &str) {
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(tool.to_string())
            .or_default()
            .insert(version.to_string());
    }

    pub fn remove(&self, tool: &str, version: &str) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(versions) = tools.get_mut(tool) {
            versions.remove(version);
            if versions.is_empty() {
                tools.remove(tool);
            }
        }
    }
}

impl VersionStorage for MemoryStorage {
    fn tool_version_path(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version)
    }

    fn is_version_installed(&self, tool: &str, version: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
            .map(|versions| versions.contains(version))
            .unwrap_or(false)
    }

    fn installed_versions(&self, tool: &str) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tool)
            .map(|versions| versions.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn installed_tools(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
