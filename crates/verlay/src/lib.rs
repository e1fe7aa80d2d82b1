//! The proxy facade: resolution, routing, and shim upkeep behind one type.
//!
//! [`Proxy`] wires the resolver, router, and shim manager over shared
//! storage and config. Install-time and teardown flows live here: installers
//! call [`Proxy::on_install`] / [`Proxy::on_uninstall`] and the dispatch
//! table follows; [`Proxy::rehash`] rebuilds it wholesale, isolating
//! per-tool failures so one broken tool never blocks the rest.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use verlay_core::platform::is_in_path;
use verlay_core::{
    ConfigStore, DirStorage, Environment, OsEnvironment, TomlConfigStore, VerlayHome,
    VersionStorage, shell,
};
use verlay_resolver::Resolver;
use verlay_router::{Router, RouterError, locate_executable};
use verlay_shim::{cleanup_broken_symlinks, create_tool_symlinks, remove_tool_symlinks};
use verlay_version::latest;

/// Outcome of a full rehash. Failures are per `tool@version`, never the
/// whole operation.
#[derive(Debug, Default)]
pub struct RehashReport {
    pub linked: usize,
    pub cleaned: usize,
    pub failures: Vec<(String, anyhow::Error)>,
}

#[derive(Debug)]
pub struct PathStatus {
    pub shim_dir: PathBuf,
    pub on_path: bool,
    pub shell: Option<&'static str>,
}

pub struct Proxy<E, S, C> {
    router: Router<E, S, C>,
    shim_dir: PathBuf,
}

/// A proxy over `$VERLAY_ROOT` (or `~/.verlay`) with the real environment.
pub fn default_proxy() -> Result<Proxy<OsEnvironment, DirStorage, TomlConfigStore>> {
    let home = VerlayHome::discover().context("cannot locate a home directory")?;
    let storage = Arc::new(DirStorage::new(home.versions_dir()));
    let config = Arc::new(TomlConfigStore::new(home.config_path()));
    let resolver = Resolver::new(OsEnvironment, storage, config);
    Ok(Proxy::new(Router::new(resolver), home.shim_dir()))
}

impl<E, S, C> Proxy<E, S, C>
where
    E: Environment,
    S: VersionStorage,
    C: ConfigStore,
{
    pub fn new(router: Router<E, S, C>, shim_dir: impl Into<PathBuf>) -> Self {
        Proxy {
            router,
            shim_dir: shim_dir.into(),
        }
    }

    pub fn router(&self) -> &Router<E, S, C> {
        &self.router
    }

    pub fn shim_dir(&self) -> &Path {
        &self.shim_dir
    }

    fn storage(&self) -> &Arc<S> {
        self.router.resolver().storage()
    }

    /// Resolve, validate, and run: the whole proxy flow for one invocation.
    pub fn intercept(&self, tool: &str, args: &[String]) -> std::result::Result<i32, RouterError> {
        self.router.intercept(tool, args)
    }

    /// Rebuild the dispatch table for every installed `(tool, version)`,
    /// then sweep broken links and flush resolution caches.
    pub fn rehash(&self) -> Result<RehashReport> {
        let mut report = RehashReport::default();

        for tool in self.storage().installed_tools() {
            self.rehash_tool(&tool, &mut report);
        }

        report.cleaned = cleanup_broken_symlinks(&self.shim_dir)
            .with_context(|| format!("sweeping '{}'", self.shim_dir.display()))?;
        self.router.resolver().clear_cache();
        Ok(report)
    }

    // Link every version of one tool, the newest last so the bare link ends
    // up on it. A version that fails is recorded and skipped.
    fn rehash_tool(&self, tool: &str, report: &mut RehashReport) {
        let versions = self.storage().installed_versions(tool);
        let default = latest(versions.iter().map(String::as_str));

        let mut ordered: Vec<&String> = versions
            .iter()
            .filter(|v| Some(v.as_str()) != default.as_ref().map(|d| d.as_str()))
            .collect();
        if let Some(default) = &default {
            if let Some(found) = versions.iter().find(|v| v.as_str() == default.as_str()) {
                ordered.push(found);
            }
        }

        for version in ordered {
            match self.link_version(tool, version) {
                Ok(()) => report.linked += 1,
                Err(err) => {
                    warn!(tool, version = %version, error = %err, "rehash failed for version");
                    report.failures.push((format!("{tool}@{version}"), err));
                }
            }
        }
    }

    fn link_version(&self, tool: &str, version: &str) -> Result<()> {
        let install_dir = self.storage().tool_version_path(tool, version);
        let binary = locate_executable(&install_dir, tool)
            .with_context(|| format!("locating binary for {tool}@{version}"))?;
        create_tool_symlinks(tool, version, &binary, &self.shim_dir)
            .with_context(|| format!("linking {tool}@{version}"))?;
        Ok(())
    }

    /// Targeted shim update after an install.
    pub fn on_install(&self, tool: &str, version: &str) -> Result<()> {
        self.link_version(tool, version)?;
        // Relink the whole tool so the bare link tracks the newest version.
        let mut report = RehashReport::default();
        self.rehash_tool(tool, &mut report);
        self.router.resolver().invalidate_tool(tool);
        match report.failures.into_iter().next() {
            Some((what, err)) => Err(err.context(format!("relinking {what}"))),
            None => Ok(()),
        }
    }

    /// Drop a version's shims; remaining versions are relinked, so removing
    /// the last one also removes the bare link.
    pub fn on_uninstall(&self, tool: &str, _version: &str) -> Result<()> {
        remove_tool_symlinks(tool, &self.shim_dir)
            .with_context(|| format!("unlinking '{tool}'"))?;
        let mut report = RehashReport::default();
        self.rehash_tool(tool, &mut report);
        self.router.resolver().invalidate_tool(tool);
        for (what, err) in &report.failures {
            warn!(what = %what, error = %err, "relink after uninstall failed");
        }
        Ok(())
    }

    /// Remove every managed shim and report leftover PATH configuration.
    pub fn teardown(&self) -> Result<PathStatus> {
        for tool in self.storage().installed_tools() {
            if let Err(err) = remove_tool_symlinks(&tool, &self.shim_dir) {
                warn!(tool = %tool, error = %err, "teardown could not unlink tool");
            }
        }
        cleanup_broken_symlinks(&self.shim_dir)
            .with_context(|| format!("sweeping '{}'", self.shim_dir.display()))?;
        self.router.resolver().clear_cache();
        Ok(self.path_status())
    }

    pub fn path_status(&self) -> PathStatus {
        PathStatus {
            shim_dir: self.shim_dir.clone(),
            on_path: is_in_path(&self.shim_dir),
            shell: shell::detect().map(|s| s.name()),
        }
    }
}
