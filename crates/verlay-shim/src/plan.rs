//! Desired-link-set planning.

use std::path::{Path, PathBuf};
use verlay_core::platform::EXE_SUFFIX;

/// One link the dispatch table should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// File name inside the shim directory.
    pub name: String,
    /// Binary the link points at.
    pub target: PathBuf,
    /// Primary links abort creation on failure; secondary failures are
    /// logged and skipped.
    pub primary: bool,
}

/// The desired link set for one `tool@version`.
///
/// Bare `tool` (primary) and `tool-<version>`; on suffix platforms both are
/// mirrored with [`EXE_SUFFIX`] appended.
pub fn plan_links(tool: &str, version: &str, binary: &Path) -> Vec<LinkSpec> {
    let mut links = vec![
        LinkSpec {
            name: tool.to_string(),
            target: binary.to_path_buf(),
            primary: true,
        },
        LinkSpec {
            name: format!("{tool}-{version}"),
            target: binary.to_path_buf(),
            primary: false,
        },
    ];

    if !EXE_SUFFIX.is_empty() {
        links.push(LinkSpec {
            name: format!("{tool}{EXE_SUFFIX}"),
            target: binary.to_path_buf(),
            primary: false,
        });
        links.push(LinkSpec {
            name: format!("{tool}-{version}{EXE_SUFFIX}"),
            target: binary.to_path_buf(),
            primary: false,
        });
    }

    links
}

/// Whether a shim file name belongs to `tool`: the canonical name or any
/// `tool-` prefixed alias, with the platform suffix stripped first.
pub(crate) fn name_belongs_to_tool(name: &str, tool: &str) -> bool {
    let base = if EXE_SUFFIX.is_empty() {
        name
    } else {
        name.strip_suffix(EXE_SUFFIX).unwrap_or(name)
    };
    base == tool || base.starts_with(&format!("{tool}-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_contains_bare_and_versioned_links() {
        let links = plan_links("kubectl", "1.28.0", Path::new("/v/kubectl/1.28.0/bin/kubectl"));

        let names: Vec<&str> = links.iter().map(|l| l.name.as_str()).collect();
        assert!(names.contains(&"kubectl"));
        assert!(names.contains(&"kubectl-1.28.0"));

        assert!(links.iter().all(|l| l.target
            == Path::new("/v/kubectl/1.28.0/bin/kubectl")));
    }

    #[test]
    fn only_the_bare_link_is_primary() {
        let links = plan_links("kubectl", "1.28.0", Path::new("/bin/kubectl"));
        let primaries: Vec<&str> = links
            .iter()
            .filter(|l| l.primary)
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(primaries, vec!["kubectl"]);
    }

    #[test]
    fn ownership_is_prefix_scoped() {
        assert!(name_belongs_to_tool("kubectl", "kubectl"));
        assert!(name_belongs_to_tool("kubectl-1.28.0", "kubectl"));
        assert!(!name_belongs_to_tool("kustomize", "kubectl"));
        assert!(!name_belongs_to_tool("kubectlx", "kubectl"));
    }
}
