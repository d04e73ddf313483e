//! Version detection over free-form commit messages.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

// ASCII digits only; `\d` would also accept other scripts' digits.
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?([0-9]+)\.([0-9]+)(?:\.[0-9]+)?").expect("version regex"));

/// A version-like token found in a message, e.g. `v2.1` or `1.4.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// The matched text, including any `v` prefix and patch component.
    pub literal: String,
    /// Major component digits, kept as text so any length compares correctly.
    major: String,
}

impl Version {
    /// Compares major components numerically, at any length.
    fn cmp_major(&self, other: &Version) -> Ordering {
        let a = self.major.trim_start_matches('0');
        let b = other.major.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMatch {
    Found(Version),
    NotFound,
}

impl VersionMatch {
    pub fn version(&self) -> Option<&Version> {
        match self {
            VersionMatch::Found(v) => Some(v),
            VersionMatch::NotFound => None,
        }
    }
}

/// Returns the first version-like token in `message`.
pub fn find_version(message: &str) -> VersionMatch {
    let Some(caps) = VERSION_RE.captures(message) else {
        return VersionMatch::NotFound;
    };

    match (caps.get(0), caps.get(1)) {
        (Some(whole), Some(major)) => VersionMatch::Found(Version {
            literal: whole.as_str().to_string(),
            major: major.as_str().to_string(),
        }),
        _ => VersionMatch::NotFound,
    }
}

/// Whether `message` mentions any of `keywords`, case-insensitively.
pub fn mentions_release_keyword<S: AsRef<str>>(message: &str, keywords: &[S]) -> bool {
    let lower = message.to_lowercase();
    keywords
        .iter()
        .any(|kw| lower.contains(&kw.as_ref().to_lowercase()))
}

/// Detects a version bump between two adjacent commit messages.
///
/// Either both messages carry different version literals, or the next
/// message mentions a release keyword on its own.
pub fn is_version_bump<S: AsRef<str>>(current: &str, next: &str, keywords: &[S]) -> bool {
    if let (VersionMatch::Found(a), VersionMatch::Found(b)) = (find_version(current), find_version(next)) {
        if a.literal != b.literal {
            return true;
        }
    }

    mentions_release_keyword(next, keywords)
}

/// A major-version jump: both sides carry a version and the later major is strictly greater.
pub fn is_major_jump(earlier: &VersionMatch, later: &VersionMatch) -> bool {
    match (earlier.version(), later.version()) {
        (Some(a), Some(b)) => b.cmp_major(a) == Ordering::Greater,
        _ => false,
    }
}
