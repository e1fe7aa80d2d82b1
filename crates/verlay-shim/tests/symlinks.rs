#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use verlay_shim::{
    ShimError, cleanup_broken_symlinks, create_tool_symlinks, list_symlinks,
    remove_tool_symlinks, validate_symlinks,
};

fn fake_binary(root: &Path, tool: &str, version: &str) -> PathBuf {
    let bin_dir = root.join(tool).join(version).join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    let binary = bin_dir.join(tool);
    fs::write(&binary, "#!/bin/sh\n").unwrap();
    binary
}

#[test]
fn create_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let shims = tmp.path().join("shims");
    let binary = fake_binary(tmp.path(), "kubectl", "1.28.0");

    create_tool_symlinks("kubectl", "1.28.0", &binary, &shims).unwrap();
    let first = list_symlinks(&shims).unwrap();

    create_tool_symlinks("kubectl", "1.28.0", &binary, &shims).unwrap();
    let second = list_symlinks(&shims).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_link(shims.join("kubectl")).unwrap(), binary);
    assert_eq!(fs::read_link(shims.join("kubectl-1.28.0")).unwrap(), binary);
}

#[test]
fn stale_link_is_repointed() {
    let tmp = tempfile::tempdir().unwrap();
    let shims = tmp.path().join("shims");
    let old = fake_binary(tmp.path(), "kubectl", "1.27.0");
    let new = fake_binary(tmp.path(), "kubectl", "1.28.0");

    create_tool_symlinks("kubectl", "1.27.0", &old, &shims).unwrap();
    create_tool_symlinks("kubectl", "1.28.0", &new, &shims).unwrap();

    assert_eq!(fs::read_link(shims.join("kubectl")).unwrap(), new);
    // Versioned aliases for both versions coexist.
    assert_eq!(fs::read_link(shims.join("kubectl-1.27.0")).unwrap(), old);
    assert_eq!(fs::read_link(shims.join("kubectl-1.28.0")).unwrap(), new);
}

#[test]
fn non_symlink_occupant_is_a_conflict() {
    let tmp = tempfile::tempdir().unwrap();
    let shims = tmp.path().join("shims");
    fs::create_dir_all(&shims).unwrap();
    fs::write(shims.join("kubectl"), "a real file").unwrap();

    let binary = fake_binary(tmp.path(), "kubectl", "1.28.0");
    let err = create_tool_symlinks("kubectl", "1.28.0", &binary, &shims).unwrap_err();

    assert!(matches!(err, ShimError::LinkConflict(_)));
    // The occupant survives.
    assert_eq!(fs::read_to_string(shims.join("kubectl")).unwrap(), "a real file");
}

#[test]
fn removal_is_scoped_to_the_tool() {
    let tmp = tempfile::tempdir().unwrap();
    let shims = tmp.path().join("shims");
    let kubectl = fake_binary(tmp.path(), "kubectl", "1.28.0");
    let kustomize = fake_binary(tmp.path(), "kustomize", "5.0.0");

    create_tool_symlinks("kubectl", "1.28.0", &kubectl, &shims).unwrap();
    create_tool_symlinks("kustomize", "5.0.0", &kustomize, &shims).unwrap();

    let removed = remove_tool_symlinks("kubectl", &shims).unwrap();
    assert_eq!(removed, 2);

    let remaining = list_symlinks(&shims).unwrap();
    assert_eq!(
        remaining,
        vec![shims.join("kustomize"), shims.join("kustomize-5.0.0")]
    );
}

#[test]
fn removal_of_absent_tool_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    let shims = tmp.path().join("shims");
    assert_eq!(remove_tool_symlinks("kubectl", &shims).unwrap(), 0);
}

#[test]
fn broken_links_are_flagged_and_cleaned() {
    let tmp = tempfile::tempdir().unwrap();
    let shims = tmp.path().join("shims");
    let binary = fake_binary(tmp.path(), "kubectl", "1.28.0");
    let doomed = fake_binary(tmp.path(), "helm", "3.14.0");

    create_tool_symlinks("kubectl", "1.28.0", &binary, &shims).unwrap();
    create_tool_symlinks("helm", "3.14.0", &doomed, &shims).unwrap();

    // Simulate an uninstall that never finished its shim cleanup.
    fs::remove_dir_all(tmp.path().join("helm")).unwrap();

    let broken = validate_symlinks(&shims).unwrap();
    assert_eq!(broken.len(), 2);
    assert!(broken.iter().all(|p| p
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("helm")));

    assert_eq!(cleanup_broken_symlinks(&shims).unwrap(), 2);
    assert!(validate_symlinks(&shims).unwrap().is_empty());

    // The healthy tool is untouched.
    assert_eq!(fs::read_link(shims.join("kubectl")).unwrap(), binary);
}
