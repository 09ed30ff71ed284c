use crate::artifacts::tags::semver::Semver;
use crate::artifacts::tags::skip_tags::SkipTags;
use anyhow::Context;
use derive_new::new;
use regex::Regex;
use std::cmp::Ordering;
use tracing::debug;

/// Only release candidates shaped like `v1.2.3-rc.4` are allowed as prereleases
pub const ALLOWED_PRERELEASE_REGEX: &str = r"^-rc\.\d+$";

#[derive(Debug, Clone, new)]
pub struct TagFilterOptions {
    owner: String,
    repo: String,
    reference: String,
    inclusive: bool,
    skip_tags: SkipTags,
}

/// Selects the release tags to sync after a given reference
#[derive(Debug)]
pub struct TagFilter {
    options: TagFilterOptions,
    allowed_prerelease: Regex,
}

impl TagFilter {
    pub fn new(options: TagFilterOptions) -> anyhow::Result<Self> {
        let allowed_prerelease = Regex::new(ALLOWED_PRERELEASE_REGEX)
            .with_context(|| format!("invalid prerelease regex: {ALLOWED_PRERELEASE_REGEX}"))?;

        Ok(TagFilter {
            options,
            allowed_prerelease,
        })
    }

    fn keep(&self, tag: &str) -> bool {
        let options = &self.options;
        if options
            .skip_tags
            .should_skip(&options.owner, &options.repo, tag)
        {
            debug!(tag, "skip listed");
            return false;
        }

        let Some(version) = Semver::parse(tag) else {
            return false;
        };
        if !version.build().is_empty() {
            return false;
        }
        if !version.prerelease().is_empty() && !self.allowed_prerelease.is_match(version.prerelease())
        {
            return false;
        }

        match Semver::compare(tag, &options.reference) {
            Ordering::Less => false,
            Ordering::Equal => options.inclusive,
            Ordering::Greater => true,
        }
    }

    /// Matching tags in ascending version order
    pub fn filter(&self, tags: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut tags = tags
            .into_iter()
            .filter(|tag| self.keep(tag))
            .collect::<Vec<_>>();

        Semver::sort(&mut tags);
        tags
    }
}
