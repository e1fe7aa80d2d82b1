#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use verlay_core::{DirStorage, MapEnvironment, MemoryConfigStore};
use verlay_resolver::{Resolver, Source};
use verlay_router::{CancellationToken, CommandInfo, Router, RouterError};

fn install_script(root: &Path, tool: &str, version: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let bin_dir = root.join(tool).join(version).join("bin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    let path = bin_dir.join(tool);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn router_for(
    root: &Path,
    cwd: &Path,
    config: Arc<MemoryConfigStore>,
) -> Router<MapEnvironment, DirStorage, MemoryConfigStore> {
    let env = MapEnvironment::new().with_cwd(cwd);
    let storage = Arc::new(DirStorage::new(root));
    Router::new(Resolver::new(env, storage, config))
}

#[test]
fn routes_to_the_global_version() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    install_script(&versions, "demo", "1.0.0", "exit 0");
    install_script(&versions, "demo", "1.1.0", "exit 0");

    let config = Arc::new(MemoryConfigStore::new());
    config.set_global("demo", "1.0.0");

    let router = router_for(&versions, tmp.path(), config);
    let route = router.route("demo", &[]).unwrap();

    assert_eq!(route.version, "1.0.0");
    assert_eq!(route.resolution.source, Source::Global);
    assert_eq!(route.executable, versions.join("demo/1.0.0/bin/demo"));
    assert_eq!(route.env.get("DEMO_VERSION").map(String::as_str), Some("1.0.0"));
    assert_eq!(route.env.get("VERLAY_MANAGED").map(String::as_str), Some("1"));
    assert_eq!(
        route.env.get("VERLAY_MANAGED_VERSION").map(String::as_str),
        Some("1.0.0")
    );
}

#[test]
fn execute_propagates_the_exit_code() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    install_script(&versions, "demo", "1.0.0", "exit 7");

    let config = Arc::new(MemoryConfigStore::new());
    let router = router_for(&versions, tmp.path(), config);

    let route = router.route("demo", &[]).unwrap();
    assert_eq!(router.execute(&route).unwrap(), 7);

    // A failing child still counts as an attempt.
    let info = router.registry().get("demo").unwrap();
    assert_eq!(info.usage_count, 1);
    assert_eq!(info.version.as_deref(), Some("1.0.0"));
}

#[test]
fn configured_but_uninstalled_version_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    install_script(&versions, "demo", "1.0.0", "exit 0");

    let config = Arc::new(MemoryConfigStore::new());
    config.set_global("demo", "2.0.0");

    let router = router_for(&versions, tmp.path(), config);
    let err = router.route("demo", &[]).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("demo@2.0.0"), "unexpected error: {message}");
    assert!(message.contains("verlay install demo 2.0.0"));
}

#[test]
fn install_dir_without_binary_is_distinct_from_not_installed() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    std::fs::create_dir_all(versions.join("demo/1.0.0")).unwrap();

    let config = Arc::new(MemoryConfigStore::new());
    let router = router_for(&versions, tmp.path(), config);

    assert!(matches!(
        router.route("demo", &[]),
        Err(RouterError::ExecutableNotFound { .. })
    ));
}

#[test]
fn registry_overrides_reach_the_route_environment() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    install_script(&versions, "demo", "1.0.0", "exit 0");

    let config = Arc::new(MemoryConfigStore::new());
    let router = router_for(&versions, tmp.path(), config);

    let mut info = CommandInfo::named("demo");
    info.env.insert("DEMO_HOME".into(), "/opt/demo".into());
    router.registry().register(info).unwrap();

    let route = router.route("demo", &[]).unwrap();
    assert_eq!(route.env.get("DEMO_HOME").map(String::as_str), Some("/opt/demo"));
}

#[test]
fn cancellation_terminates_the_child() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    install_script(&versions, "demo", "1.0.0", "sleep 30");

    let config = Arc::new(MemoryConfigStore::new());
    let router = router_for(&versions, tmp.path(), config);
    let route = router.route("demo", &[]).unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        canceller.cancel();
    });

    let started = Instant::now();
    let outcome = router.execute_with_cancellation(&route, &token);
    handle.join().unwrap();

    assert!(matches!(outcome, Err(RouterError::Cancelled { .. })));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "child was not killed promptly"
    );
}

#[test]
fn intercept_runs_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let versions = tmp.path().join("versions");
    install_script(&versions, "demo", "1.0.0", "exit 3");

    let config = Arc::new(MemoryConfigStore::new());
    let router = router_for(&versions, tmp.path(), config);

    assert_eq!(router.intercept("demo", &[]).unwrap(), 3);
}
