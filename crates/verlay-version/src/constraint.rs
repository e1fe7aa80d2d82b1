//! Semver range constraints over installed versions.

use crate::version::Version;
use semver::VersionReq;
use tracing::warn;

/// A version selector from configuration: a semver range when it parses
/// (`^1.2`, `>=1.20, <2`), otherwise an exact-match fallback on the raw text.
#[derive(Debug, Clone)]
pub struct Constraint {
    raw: String,
    req: Option<VersionReq>,
}

impl Constraint {
    pub fn parse(s: &str) -> Self {
        let raw = s.trim().to_string();
        let req = VersionReq::parse(&raw).ok();
        Constraint { raw, req }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the text parsed as a semver range.
    pub fn is_range(&self) -> bool {
        self.req.is_some()
    }

    /// Pick the best installed version for this constraint.
    ///
    /// A range selects the maximum satisfying semver out of `installed`;
    /// installed versions that do not parse are skipped with a warning.
    /// Unparseable constraint text degrades to an exact string match.
    pub fn best_match<'a, I>(&self, installed: I) -> Option<Version>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match &self.req {
            Some(req) => {
                let mut best: Option<Version> = None;
                for candidate in installed {
                    let version = Version::parse(candidate);
                    let Some(semver) = version.semver() else {
                        warn!(
                            version = candidate,
                            constraint = %self.raw,
                            "skipping unparseable installed version"
                        );
                        continue;
                    };
                    if !req.matches(semver) {
                        continue;
                    }
                    let better = match &best {
                        Some(current) => semver > current.semver().unwrap(),
                        None => true,
                    };
                    if better {
                        best = Some(version);
                    }
                }
                best
            }
            None => installed
                .into_iter()
                .find(|candidate| *candidate == self.raw)
                .map(Version::parse),
        }
    }
}
