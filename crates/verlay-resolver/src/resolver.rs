//! The precedence chain and its caches.

use crate::error::ResolveError;
use crate::files;
use crate::resolution::{Source, VersionResolution};
use crate::strings::{SpecFailure, resolve_spec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;
use verlay_cache::{Cache, CacheStats, FastCache};
use verlay_core::{ConfigStore, Environment, VersionStorage};
use verlay_version::latest;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
const CACHE_SIZE: usize = 256;

/// Environment variable that overrides every other tier for one tool.
pub fn override_var(tool: &str) -> String {
    let sanitized: String = tool
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("VERLAY_{sanitized}_VERSION")
}

type Key = (String, Option<PathBuf>);

struct ProjectHit {
    spec: String,
    config_path: PathBuf,
    project_dir: PathBuf,
}

pub struct Resolver<E, S, C> {
    env: E,
    storage: Arc<S>,
    config: Arc<C>,
    cache: Cache<Key, VersionResolution>,
    fast: FastCache<Key, VersionResolution>,
    ttl: Duration,
}

impl<E, S, C> Resolver<E, S, C>
where
    E: Environment,
    S: VersionStorage,
    C: ConfigStore,
{
    pub fn new(env: E, storage: Arc<S>, config: Arc<C>) -> Self {
        Self::with_ttl(env, storage, config, DEFAULT_TTL)
    }

    pub fn with_ttl(env: E, storage: Arc<S>, config: Arc<C>, ttl: Duration) -> Self {
        Resolver {
            env,
            storage,
            config,
            cache: Cache::new(CACHE_SIZE),
            fast: FastCache::new(CACHE_SIZE),
            ttl,
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &Arc<C> {
        &self.config
    }

    /// Resolve the effective version of `tool` as seen from `working_dir`.
    pub fn resolve(
        &self,
        tool: &str,
        working_dir: &Path,
    ) -> Result<VersionResolution, ResolveError> {
        // Tier 1: env override. Cheap and absolute, bypasses the caches.
        if let Some(requested) = self.env.var(&override_var(tool)) {
            let requested = requested.trim().to_string();
            if !requested.is_empty() {
                if !self.storage.is_version_installed(tool, &requested) {
                    return Err(ResolveError::not_installed(tool, &requested));
                }
                debug!(tool, version = %requested, "env override wins");
                return Ok(self.finish(tool, Some(requested.clone()), requested, Source::Env, None, None));
            }
        }

        // Tier 2 needs the walk regardless, so run it before consulting the
        // caches; the walk also determines the cache key's project part.
        let hit = self.find_project_spec(tool, working_dir)?;
        let key: Key = (
            tool.to_string(),
            hit.as_ref().map(|h| h.project_dir.clone()),
        );

        // Fast path first; entries older than the TTL fall through to the
        // authoritative cache so staleness cannot outlive it.
        if let Some(res) = self.fast.get(&key) {
            if !self.is_stale(&res) {
                return Ok(res);
            }
            self.fast.invalidate(&key);
        }
        if let Some(res) = self.cache.get(&key) {
            // Manual pins carry caller-chosen TTLs the fast path's staleness
            // check knows nothing about; serve them from the cache only.
            if res.source != Source::Manual {
                self.fast.put(key, res.clone());
            }
            return Ok(res);
        }

        let resolution = match hit {
            Some(hit) => self.solve_tier(
                tool,
                &hit.spec,
                Source::Project,
                Some(hit.project_dir),
                Some(hit.config_path),
            )?,
            None => self.resolve_below_project(tool)?,
        };

        self.cache.set(key.clone(), resolution.clone(), Some(self.ttl));
        self.fast.put(key, resolution.clone());
        Ok(resolution)
    }

    /// Seed the cache with an explicitly chosen version. The entry expires by
    /// TTL like any other and is never refreshed early by a discovering read.
    pub fn cache_manual(
        &self,
        tool: &str,
        version: &str,
        project_dir: Option<PathBuf>,
        ttl: Option<Duration>,
    ) -> VersionResolution {
        let resolution = self.finish(
            tool,
            Some(version.to_string()),
            version.to_string(),
            Source::Manual,
            project_dir.clone(),
            None,
        );
        let key = (tool.to_string(), project_dir);
        self.fast.invalidate(&key);
        self.cache.set(key, resolution.clone(), ttl);
        resolution
    }

    /// Drop every cached resolution for `tool`.
    pub fn invalidate_tool(&self, tool: &str) {
        self.cache.invalidate_if(|(cached, _)| cached == tool);
        self.fast.invalidate_if(|(cached, _)| cached == tool);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        self.fast.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn is_stale(&self, res: &VersionResolution) -> bool {
        res.resolved_at
            .elapsed()
            .map(|age| !self.ttl.is_zero() && age > self.ttl)
            .unwrap_or(false)
    }

    // Tier 2 probe: nearest ancestor naming the tool, marker files before
    // structured config at each level.
    fn find_project_spec(
        &self,
        tool: &str,
        working_dir: &Path,
    ) -> Result<Option<ProjectHit>, ResolveError> {
        for level in working_dir.ancestors() {
            if let Some(hit) = files::probe_level(level, tool) {
                return Ok(Some(ProjectHit {
                    spec: hit.version,
                    config_path: hit.path,
                    project_dir: level.to_path_buf(),
                }));
            }
            if let Some(project) = self.config.load_project(level)? {
                if let Some(spec) = project.tools.get(tool) {
                    return Ok(Some(ProjectHit {
                        spec: spec.clone(),
                        config_path: project.path,
                        project_dir: level.to_path_buf(),
                    }));
                }
            }
        }
        Ok(None)
    }

    // Tiers 3 and 4.
    fn resolve_below_project(&self, tool: &str) -> Result<VersionResolution, ResolveError> {
        if let Some(spec) = self.config.load_global()?.tools.get(tool).cloned() {
            return self.solve_tier(tool, &spec, Source::Global, None, self.config.global_path());
        }

        let installed = self.storage.installed_versions(tool);
        match latest(installed.iter().map(String::as_str)) {
            Some(version) => {
                let version = version.as_str().to_string();
                Ok(self.finish(tool, None, version, Source::Latest, None, None))
            }
            None => Err(ResolveError::Unresolvable {
                tool: tool.to_string(),
            }),
        }
    }

    // Solve one tier's version string; failure here is the resolution's
    // result, lower tiers are not consulted.
    fn solve_tier(
        &self,
        tool: &str,
        spec: &str,
        source: Source,
        project_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<VersionResolution, ResolveError> {
        let installed = self.storage.installed_versions(tool);
        let aliases = self.config.load_global()?.aliases;

        match resolve_spec(spec, &installed, &aliases) {
            Ok(version) => Ok(self.finish(
                tool,
                Some(spec.to_string()),
                version,
                source,
                project_path,
                config_path,
            )),
            Err(SpecFailure::NotInstalled { version }) => {
                Err(ResolveError::not_installed(tool, &version))
            }
            Err(SpecFailure::NoMatch) => Err(ResolveError::InvalidVersionSpec {
                tool: tool.to_string(),
                spec: spec.to_string(),
            }),
        }
    }

    fn finish(
        &self,
        tool: &str,
        requested: Option<String>,
        version: String,
        source: Source,
        project_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> VersionResolution {
        let installed = self.storage.is_version_installed(tool, &version);
        VersionResolution {
            tool: tool.to_string(),
            requested,
            version,
            source,
            project_path,
            config_path,
            installed,
            resolved_at: SystemTime::now(),
        }
    }
}
