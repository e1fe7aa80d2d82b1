use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use verlay_core::{MapEnvironment, MemoryConfigStore, MemoryStorage};
use verlay_resolver::{ResolveError, Resolver, Source, override_var};

fn setup() -> (MapEnvironment, Arc<MemoryStorage>, Arc<MemoryConfigStore>) {
    (
        MapEnvironment::new(),
        Arc::new(MemoryStorage::new("/versions")),
        Arc::new(MemoryConfigStore::new()),
    )
}

#[test]
fn unconfigured_tool_resolves_to_semver_maximum() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.2.0");
    storage.add("demo", "1.10.0");
    storage.add("demo", "nightly");

    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", Path::new("/anywhere")).unwrap();

    assert_eq!(res.version, "1.10.0");
    assert_eq!(res.source, Source::Latest);
    assert_eq!(res.requested, None);
    assert!(res.installed);
}

#[test]
fn latest_degrades_to_lexicographic_when_nothing_parses() {
    let (env, storage, config) = setup();
    storage.add("demo", "alpha");
    storage.add("demo", "beta");

    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", Path::new("/anywhere")).unwrap();
    assert_eq!(res.version, "beta");
}

#[test]
fn nothing_installed_is_unresolvable() {
    let (env, storage, config) = setup();
    let resolver = Resolver::new(env, storage, config);

    let err = resolver.resolve("demo", Path::new("/anywhere")).unwrap_err();
    assert!(matches!(err, ResolveError::Unresolvable { .. }));
}

#[test]
fn env_override_beats_project_and_global() {
    let (_, storage, config) = setup();
    storage.add("demo", "1.0.0");
    storage.add("demo", "1.1.0");
    storage.add("demo", "1.2.0");
    config.set_global("demo", "1.0.0");
    config.set_project("/proj", "demo", "1.1.0");

    let env = MapEnvironment::new().with_var(override_var("demo"), "1.2.0");
    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", Path::new("/proj")).unwrap();

    assert_eq!(res.version, "1.2.0");
    assert_eq!(res.source, Source::Env);
}

#[test]
fn env_override_of_missing_version_fails_fast() {
    let (_, storage, config) = setup();
    storage.add("demo", "1.0.0");
    config.set_global("demo", "1.0.0");

    let env = MapEnvironment::new().with_var(override_var("demo"), "9.9.9");
    let resolver = Resolver::new(env, storage, config);

    let err = resolver.resolve("demo", Path::new("/proj")).unwrap_err();
    assert!(matches!(err, ResolveError::NotInstalled { .. }));
    let message = err.to_string();
    assert!(message.contains("verlay install demo 9.9.9"));
}

#[test]
fn project_config_beats_global_only_under_the_project() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    storage.add("demo", "1.1.0");
    config.set_global("demo", "1.0.0");
    config.set_project("/proj", "demo", "1.1.0");

    let resolver = Resolver::new(env, storage, config);

    let inside = resolver.resolve("demo", Path::new("/proj/src/deep")).unwrap();
    assert_eq!(inside.version, "1.1.0");
    assert_eq!(inside.source, Source::Project);
    assert_eq!(inside.project_path.as_deref(), Some(Path::new("/proj")));

    let outside = resolver.resolve("demo", Path::new("/elsewhere")).unwrap();
    assert_eq!(outside.version, "1.0.0");
    assert_eq!(outside.source, Source::Global);
}

#[test]
fn project_naming_an_uninstalled_version_never_substitutes() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    config.set_global("demo", "1.0.0");
    config.set_project("/proj", "demo", "2.0.0");

    let resolver = Resolver::new(env, storage, config);
    let err = resolver.resolve("demo", Path::new("/proj")).unwrap_err();

    assert!(
        matches!(&err, ResolveError::NotInstalled { tool, version }
            if tool == "demo" && version == "2.0.0"),
        "expected NotInstalled, got {err:?}"
    );
}

#[test]
fn unresolvable_project_spec_never_falls_through() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    config.set_global("demo", "1.0.0");
    config.set_project("/proj", "demo", "^9");

    let resolver = Resolver::new(env, storage, config);
    let err = resolver.resolve("demo", Path::new("/proj")).unwrap_err();

    assert!(
        matches!(&err, ResolveError::InvalidVersionSpec { spec, .. } if spec == "^9"),
        "expected InvalidVersionSpec, got {err:?}"
    );
}

#[test]
fn global_constraint_picks_maximum_installed_satisfier() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.2.0");
    storage.add("demo", "1.9.0");
    storage.add("demo", "2.0.0");
    config.set_global("demo", "^1.2");

    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", Path::new("/anywhere")).unwrap();

    assert_eq!(res.version, "1.9.0");
    assert_eq!(res.requested.as_deref(), Some("^1.2"));
}

#[test]
fn aliases_resolve_from_any_tier() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    storage.add("demo", "1.4.0");
    config.set_alias("stable", "^1.0");
    config.set_project("/proj", "demo", "stable");

    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", Path::new("/proj")).unwrap();
    assert_eq!(res.version, "1.4.0");
    assert_eq!(res.source, Source::Project);
}

#[test]
fn marker_files_walk_up_from_the_working_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let project = tmp.path().join("ws");
    let nested = project.join("app/src");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(project.join(".tool-versions"), "demo 1.1.0\n").unwrap();

    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    storage.add("demo", "1.1.0");
    config.set_global("demo", "1.0.0");

    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", &nested).unwrap();

    assert_eq!(res.version, "1.1.0");
    assert_eq!(res.source, Source::Project);
    assert_eq!(res.project_path.as_deref(), Some(project.as_path()));
    assert_eq!(
        res.config_path.as_deref(),
        Some(project.join(".tool-versions").as_path())
    );
}

#[test]
fn single_tool_marker_beats_list_and_structured_config() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(".demo-version"), "1.2.0\n").unwrap();
    std::fs::write(tmp.path().join(".tool-versions"), "demo 1.1.0\n").unwrap();

    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    storage.add("demo", "1.1.0");
    storage.add("demo", "1.2.0");
    config.set_project(tmp.path(), "demo", "1.0.0");

    let resolver = Resolver::new(env, storage, config);
    let res = resolver.resolve("demo", tmp.path()).unwrap();
    assert_eq!(res.version, "1.2.0");
}

#[test]
fn resolutions_are_cached_until_invalidated() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    config.set_global("demo", "1.0.0");

    let resolver = Resolver::new(env, storage, config.clone());
    resolver.resolve("demo", Path::new("/w")).unwrap();

    // The global mapping changes, but the cached answer still serves.
    config.set_global("demo", "latest");
    let cached = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(cached.version, "1.0.0");

    resolver.invalidate_tool("demo");
    let fresh = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(fresh.version, "1.0.0");
    assert_eq!(fresh.requested.as_deref(), Some("latest"));
}

#[test]
fn cached_resolution_expires_by_ttl() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    config.set_global("demo", "1.0.0");

    let resolver =
        Resolver::with_ttl(env, storage, config.clone(), Duration::from_millis(50));

    let first = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(first.version, "1.0.0");

    config.set_global("demo", "latest");

    // Immediate re-read hits the cache.
    let cached = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(cached.requested.as_deref(), Some("1.0.0"));

    std::thread::sleep(Duration::from_millis(60));

    // Past the TTL the read misses and recomputes against current config.
    let fresh = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(fresh.requested.as_deref(), Some("latest"));
}

#[test]
fn manual_cache_writes_serve_until_expiry() {
    let (env, storage, config) = setup();
    storage.add("demo", "1.0.0");
    storage.add("demo", "1.1.0");
    config.set_global("demo", "1.0.0");

    let resolver = Resolver::new(env, storage, config);
    let manual = resolver.cache_manual("demo", "1.1.0", None, Some(Duration::from_millis(50)));
    assert_eq!(manual.source, Source::Manual);

    let served = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(served.version, "1.1.0");
    assert_eq!(served.source, Source::Manual);

    std::thread::sleep(Duration::from_millis(60));

    let fresh = resolver.resolve("demo", Path::new("/w")).unwrap();
    assert_eq!(fresh.source, Source::Global);
    assert_eq!(fresh.version, "1.0.0");
}
