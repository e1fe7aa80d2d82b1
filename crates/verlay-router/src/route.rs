//! Routing: resolution, executable lookup, environment construction.

use crate::cancel::CancellationToken;
use crate::error::RouterError;
use crate::exec;
use crate::registry::CommandRegistry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use verlay_core::platform::EXE_SUFFIX;
use verlay_core::{ConfigStore, Environment, VersionStorage};
use verlay_resolver::{Resolver, VersionResolution};

/// Everything needed to run one invocation. Created per call, consumed by
/// [`Router::execute`], never persisted.
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub tool: String,
    pub version: String,
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Layered on top of the inherited environment at spawn time.
    pub env: BTreeMap<String, String>,
    pub workdir: PathBuf,
    pub resolution: VersionResolution,
}

#[cfg(unix)]
fn has_exec_bit(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_meta: &std::fs::Metadata) -> bool {
    true
}

pub(crate) fn is_executable_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && has_exec_bit(&meta),
        Err(_) => false,
    }
}

/// Find the tool's binary inside one version's install directory.
///
/// Candidates in order: `bin/<tool>`, `<tool>`, then the same pair with the
/// platform suffix. Deliberately no PATH fallback.
pub fn locate_executable(install_dir: &Path, tool: &str) -> Result<PathBuf, RouterError> {
    let mut names = vec![
        PathBuf::from("bin").join(tool),
        PathBuf::from(tool),
    ];
    if !EXE_SUFFIX.is_empty() {
        names.push(PathBuf::from("bin").join(format!("{tool}{EXE_SUFFIX}")));
        names.push(PathBuf::from(format!("{tool}{EXE_SUFFIX}")));
    }

    let mut present_but_unrunnable = None;
    for name in names {
        let candidate = install_dir.join(name);
        if !candidate.is_file() {
            continue;
        }
        if is_executable_file(&candidate) {
            return Ok(candidate);
        }
        present_but_unrunnable.get_or_insert(candidate);
    }

    match present_but_unrunnable {
        Some(path) => Err(RouterError::NotExecutable { path }),
        None => Err(RouterError::ExecutableNotFound {
            tool: tool.to_string(),
            dir: install_dir.to_path_buf(),
        }),
    }
}

fn tool_env_name(tool: &str) -> String {
    tool.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub struct Router<E, S, C> {
    resolver: Resolver<E, S, C>,
    storage: Arc<S>,
    registry: CommandRegistry,
}

impl<E, S, C> Router<E, S, C>
where
    E: Environment,
    S: VersionStorage,
    C: ConfigStore,
{
    pub fn new(resolver: Resolver<E, S, C>) -> Self {
        let storage = resolver.storage().clone();
        Router {
            resolver,
            storage,
            registry: CommandRegistry::new(),
        }
    }

    pub fn resolver(&self) -> &Resolver<E, S, C> {
        &self.resolver
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Resolve and validate an invocation without running it.
    pub fn route(&self, tool: &str, args: &[String]) -> Result<RouteResult, RouterError> {
        let workdir = self
            .resolver
            .env()
            .current_dir()
            .unwrap_or_else(|| PathBuf::from("."));

        let resolution = self.resolver.resolve(tool, &workdir)?;

        // Resolution naming an uninstalled version is an error, not a
        // fallback; re-check here so cached answers cannot outlive an
        // uninstall.
        if !self.storage.is_version_installed(tool, &resolution.version) {
            return Err(RouterError::NotInstalled {
                tool: tool.to_string(),
                version: resolution.version.clone(),
            });
        }

        let install_dir = self.storage.tool_version_path(tool, &resolution.version);
        let executable = locate_executable(&install_dir, tool)?;
        debug!(tool, version = %resolution.version, executable = %executable.display(), "routed");

        let env = self.build_env(tool, &resolution, &workdir);
        Ok(RouteResult {
            tool: tool.to_string(),
            version: resolution.version.clone(),
            executable,
            args: args.to_vec(),
            env,
            workdir,
            resolution,
        })
    }

    /// Run a routed invocation, blocking until the child exits, and return
    /// its exit code. A non-zero exit is the child's result, not an error.
    pub fn execute(&self, route: &RouteResult) -> Result<i32, RouterError> {
        self.execute_with_cancellation(route, &CancellationToken::new())
    }

    pub fn execute_with_cancellation(
        &self,
        route: &RouteResult,
        token: &CancellationToken,
    ) -> Result<i32, RouterError> {
        let outcome = exec::run_child(route, token);
        // Stats are bookkeeping; they record the attempt either way and
        // never change the outcome.
        self.registry
            .record_usage(&route.tool, &route.version, &route.executable);
        outcome
    }

    /// `route` then `execute`.
    pub fn intercept(&self, tool: &str, args: &[String]) -> Result<i32, RouterError> {
        let route = self.route(tool, args)?;
        self.execute(&route)
    }

    fn build_env(
        &self,
        tool: &str,
        resolution: &VersionResolution,
        workdir: &Path,
    ) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            format!("{}_VERSION", tool_env_name(tool)),
            resolution.version.clone(),
        );
        env.insert("VERLAY_MANAGED".to_string(), "1".to_string());
        env.insert(
            "VERLAY_MANAGED_VERSION".to_string(),
            resolution.version.clone(),
        );
        env.insert(
            "VERLAY_WORKDIR".to_string(),
            workdir.display().to_string(),
        );
        for (name, value) in self.registry.env_overrides(tool) {
            env.insert(name, value);
        }
        env
    }
}
