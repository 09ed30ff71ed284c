use crate::areas::github::ReleaseHost;
use crate::areas::repository::Repository;
use crate::artifacts::tags::filter::{TagFilter, TagFilterOptions};
use crate::artifacts::tags::skip_tags::SkipTags;
use anyhow::Context;
use tracing::info;

impl Repository {
    /// Print the release tags of `owner/repo` to sync after `reference`, oldest first
    pub async fn release_tags(
        &self,
        github: &dyn ReleaseHost,
        owner: &str,
        repo: &str,
        reference: &str,
        inclusive: bool,
        skip_tags: SkipTags,
    ) -> anyhow::Result<()> {
        let filter = TagFilter::new(TagFilterOptions::new(
            owner.to_string(),
            repo.to_string(),
            reference.to_string(),
            inclusive,
            skip_tags,
        ))?;

        let tag_names = github
            .all_release_tag_names(owner, repo)
            .await
            .context("fetch all release tag names")?;
        let total = tag_names.len();
        let tags = filter.filter(tag_names);
        info!(owner, repo, total, kept = tags.len(), "filtered release tags");

        write!(self.writer(), "{}", tags.join("\n")).context("write release tags to stdout")?;

        Ok(())
    }
}
