//! Semantic versions as used in release tags
//!
//! Versions carry a mandatory `v` prefix. `vMAJOR` and `vMAJOR.MINOR` are accepted as
//! shorthands for `vMAJOR.0.0` and `vMAJOR.MINOR.0`, but only without prerelease or
//! build suffixes. Invalid versions compare lower than every valid one and equal to
//! each other.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct Semver {
    major: String,
    minor: String,
    patch: String,
    // including the leading '-'
    prerelease: String,
    // including the leading '+'
    build: String,
}

impl Semver {
    pub fn parse(v: &str) -> Option<Self> {
        let rest = v.strip_prefix('v')?;

        let (major, rest) = parse_int(rest)?;
        if rest.is_empty() {
            return Some(Self::shorthand(major, "0"));
        }
        let rest = rest.strip_prefix('.')?;
        let (minor, rest) = parse_int(rest)?;
        if rest.is_empty() {
            return Some(Self::shorthand(major, minor));
        }
        let rest = rest.strip_prefix('.')?;
        let (patch, rest) = parse_int(rest)?;

        let (prerelease, rest) = match rest.strip_prefix('-') {
            Some(_) => {
                let end = rest.find('+').unwrap_or(rest.len());
                let prerelease = &rest[..end];
                if !is_valid_prerelease(&prerelease[1..]) {
                    return None;
                }
                (prerelease, &rest[end..])
            }
            None => ("", rest),
        };

        let build = match rest.strip_prefix('+') {
            Some(build) if is_valid_build(build) => rest,
            Some(_) => return None,
            None if rest.is_empty() => "",
            None => return None,
        };

        Some(Semver {
            major: major.to_string(),
            minor: minor.to_string(),
            patch: patch.to_string(),
            prerelease: prerelease.to_string(),
            build: build.to_string(),
        })
    }

    fn shorthand(major: &str, minor: &str) -> Self {
        Semver {
            major: major.to_string(),
            minor: minor.to_string(),
            patch: "0".to_string(),
            prerelease: String::new(),
            build: String::new(),
        }
    }

    pub fn is_valid(v: &str) -> bool {
        Self::parse(v).is_some()
    }

    pub fn prerelease(&self) -> &str {
        &self.prerelease
    }

    pub fn build(&self) -> &str {
        &self.build
    }

    /// Compare two version strings, ordering invalid ones first
    pub fn compare(a: &str, b: &str) -> Ordering {
        match (Self::parse(a), Self::parse(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }

    /// Sort version strings, breaking ties by the raw string
    pub fn sort(versions: &mut [String]) {
        versions.sort_by(|a, b| Self::compare(a, b).then_with(|| a.cmp(b)));
    }
}

impl Ord for Semver {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_int(&self.major, &other.major)
            .then_with(|| compare_int(&self.minor, &other.minor))
            .then_with(|| compare_int(&self.patch, &other.patch))
            .then_with(|| compare_prerelease(&self.prerelease, &other.prerelease))
    }
}

// build metadata does not take part in equality
impl PartialEq for Semver {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Semver {}

impl PartialOrd for Semver {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_int(s: &str) -> Option<(&str, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let num = &s[..end];
    if num.is_empty() || (num.len() > 1 && num.starts_with('0')) {
        return None;
    }

    Some((num, &s[end..]))
}

fn is_identifier(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_numeric(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_prerelease(prerelease: &str) -> bool {
    prerelease
        .split('.')
        .all(|id| is_identifier(id) && !(is_numeric(id) && id.len() > 1 && id.starts_with('0')))
}

fn is_valid_build(build: &str) -> bool {
    build.split('.').all(is_identifier)
}

// numbers without leading zeros order by length first
fn compare_int(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut a_ids = a[1..].split('.');
    let mut b_ids = b[1..].split('.');
    loop {
        match (a_ids.next(), b_ids.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = match (is_numeric(a), is_numeric(b)) {
                    (true, true) => compare_int(a, b),
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => a.cmp(b),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
