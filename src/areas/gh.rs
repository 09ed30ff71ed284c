use crate::areas::git::run_command;
use anyhow::Context;
use derive_new::new;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Inline review comment on one line of a pull request file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, new)]
pub struct ReviewComment {
    body: String,
    /// Head commit the line refers to
    commit_id: String,
    path: String,
    line: usize,
}

/// The GitHub CLI, authenticated for the repository checked out at `path`
#[derive(Debug, Clone)]
pub struct GhCli {
    path: Box<Path>,
}

impl GhCli {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GhCli {
            path: path.into().into_boxed_path(),
        }
    }

    /// `owner/repo` of the checked out repository
    pub async fn name_with_owner(&self) -> anyhow::Result<String> {
        let output = run_command(
            &self.path,
            "gh",
            &["repo", "view", "--json", "nameWithOwner", "-q", ".nameWithOwner"],
            None,
        )
        .await
        .context("get repository name")?;

        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }

    pub async fn post_review_comment(
        &self,
        repository: &str,
        pr_number: &str,
        comment: &ReviewComment,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(comment).context("encode review comment")?;
        let endpoint = format!("repos/{repository}/pulls/{pr_number}/comments");

        run_command(
            &self.path,
            "gh",
            &["api", &endpoint, "-X", "POST", "--input", "-"],
            Some(&payload),
        )
        .await
        .with_context(|| format!("post comment on {}:{}", comment.path, comment.line))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn review_comment_payload() -> anyhow::Result<()> {
        let comment = ReviewComment::new(
            "> _1 files changed_".to_string(),
            "abc123".to_string(),
            "modules/sync/o/r/state.json".to_string(),
            42,
        );

        assert_eq!(
            serde_json::to_value(&comment)?,
            serde_json::json!({
                "body": "> _1 files changed_",
                "commit_id": "abc123",
                "path": "modules/sync/o/r/state.json",
                "line": 42
            })
        );
        Ok(())
    }
}
