//! Version types and "latest" ordering.

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version as SemVer;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

static V_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[vV](?<rest>[0-9].*)$").unwrap());

/// A tool version as found on disk or in configuration.
///
/// Parsing never fails: strings that are not semantic versions land in the
/// [`Version::Raw`] arm and keep their exact spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    SemVer { raw: String, version: SemVer },
    Raw(String),
}

impl Version {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let candidate = V_PREFIX_REGEX
            .captures(trimmed)
            .and_then(|caps| caps.name("rest"))
            .map(|m| m.as_str())
            .unwrap_or(trimmed);

        match SemVer::parse(candidate) {
            Ok(version) => Version::SemVer {
                raw: trimmed.to_string(),
                version,
            },
            Err(_) => Version::Raw(trimmed.to_string()),
        }
    }

    /// The original string form.
    pub fn as_str(&self) -> &str {
        match self {
            Version::SemVer { raw, .. } => raw,
            Version::Raw(raw) => raw,
        }
    }

    pub fn semver(&self) -> Option<&SemVer> {
        match self {
            Version::SemVer { version, .. } => Some(version),
            Version::Raw(_) => None,
        }
    }

    pub fn is_semver(&self) -> bool {
        matches!(self, Version::SemVer { .. })
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Version::parse(s))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the newest version out of `candidates`.
///
/// If any candidate parses as a semantic version the semver maximum wins and
/// raw candidates are skipped (with a warning). Only when nothing parses does
/// the lexicographic maximum of the raw strings apply.
pub fn latest<'a, I>(candidates: I) -> Option<Version>
where
    I: IntoIterator<Item = &'a str>,
{
    let parsed: Vec<Version> = candidates.into_iter().map(Version::parse).collect();

    let semver_max = parsed
        .iter()
        .filter(|v| v.is_semver())
        .max_by(|a, b| a.semver().unwrap().cmp(b.semver().unwrap()));

    if let Some(max) = semver_max {
        for skipped in parsed.iter().filter(|v| !v.is_semver()) {
            warn!(version = skipped.as_str(), "skipping unparseable version");
        }
        return Some(max.clone());
    }

    parsed.into_iter().max_by(|a, b| a.as_str().cmp(b.as_str()))
}
