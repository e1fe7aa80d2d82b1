//! On-disk layout of the verlay root.
//!
//! ```text
//! ~/.verlay/
//!   config.toml     global version mapping + aliases
//!   versions/       <tool>/<version>/ install trees
//!   shims/          dispatch symlinks
//! ```

use std::path::{Path, PathBuf};

pub const ROOT_ENV: &str = "VERLAY_ROOT";
const ROOT_DIR: &str = ".verlay";

#[derive(Debug, Clone)]
pub struct VerlayHome {
    root: PathBuf,
}

impl VerlayHome {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        VerlayHome { root: root.into() }
    }

    /// `$VERLAY_ROOT` when set, else `~/.verlay`.
    pub fn discover() -> Option<Self> {
        if let Some(root) = std::env::var_os(ROOT_ENV) {
            return Some(Self::new(PathBuf::from(root)));
        }
        home::home_dir().map(|home| Self::new(home.join(ROOT_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn shim_dir(&self) -> PathBuf {
        self.root.join("shims")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_hangs_off_root() {
        let home = VerlayHome::new("/opt/verlay");
        assert_eq!(home.config_path(), PathBuf::from("/opt/verlay/config.toml"));
        assert_eq!(home.versions_dir(), PathBuf::from("/opt/verlay/versions"));
        assert_eq!(home.shim_dir(), PathBuf::from("/opt/verlay/shims"));
    }
}
