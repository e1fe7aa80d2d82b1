//! Version-string solving: literal, alias, constraint.

use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use verlay_version::{Constraint, Version, latest};

const MAX_ALIAS_DEPTH: usize = 8;

/// Why a version string failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecFailure {
    /// The string is a well-formed version that simply is not installed.
    NotInstalled { version: String },
    /// No strategy produced an installed version.
    NoMatch,
}

/// Resolve one configured version string against the installed set.
///
/// Strategy order: installed literal, alias (built-in `latest`/`system`, then
/// the user table, followed recursively), then semver constraint with an
/// exact-match fallback for unparseable constraint text. A literal that
/// parses but is not installed fails immediately, no other strategy is tried.
pub fn resolve_spec(
    spec: &str,
    installed: &[String],
    aliases: &BTreeMap<String, String>,
) -> Result<String, SpecFailure> {
    let mut visited = HashSet::new();
    resolve_inner(spec, installed, aliases, &mut visited, 0)
}

fn resolve_inner(
    spec: &str,
    installed: &[String],
    aliases: &BTreeMap<String, String>,
    visited: &mut HashSet<String>,
    depth: usize,
) -> Result<String, SpecFailure> {
    let spec = spec.trim();

    // Literal tier: a parseable version either matches an installed one or
    // fails outright.
    let literal = Version::parse(spec);
    if let Some(wanted) = literal.semver() {
        let found = installed
            .iter()
            .find(|candidate| Version::parse(candidate).semver() == Some(wanted));
        return match found {
            Some(version) => Ok(version.clone()),
            None => Err(SpecFailure::NotInstalled {
                version: spec.to_string(),
            }),
        };
    }

    // Alias tier.
    if spec == "latest" {
        return latest(installed.iter().map(String::as_str))
            .map(|v| v.as_str().to_string())
            .ok_or(SpecFailure::NoMatch);
    }
    if spec == "system" {
        // A storage-level pseudo-version; never a PATH escape hatch.
        return if installed.iter().any(|v| v == "system") {
            Ok("system".to_string())
        } else {
            Err(SpecFailure::NoMatch)
        };
    }
    if let Some(target) = aliases.get(spec) {
        if depth >= MAX_ALIAS_DEPTH || !visited.insert(spec.to_string()) {
            debug!(alias = spec, "alias chain too deep or cyclic");
            return Err(SpecFailure::NoMatch);
        }
        return resolve_inner(target, installed, aliases, visited, depth + 1);
    }

    // Constraint tier.
    let constraint = Constraint::parse(spec);
    constraint
        .best_match(installed.iter().map(String::as_str))
        .map(|v| v.as_str().to_string())
        .ok_or(SpecFailure::NoMatch)
}
