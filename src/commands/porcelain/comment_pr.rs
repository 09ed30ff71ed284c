use crate::areas::gh::ReviewComment;
use crate::areas::git::Git;
use crate::areas::repository::Repository;
use crate::artifacts::diff::report::Format;
use crate::artifacts::pr::StateTransition;
use crate::artifacts::pr::module_finder::{changed_module_paths, module_state_file};
use crate::artifacts::pr::transitions::{appended_count, detect_transitions, digest_line_numbers};
use crate::artifacts::state::module_state::ModuleState;
use anyhow::Context;
use colored::Colorize;
use derive_new::new;
use std::path::Path;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// The pull request being commented on
#[derive(Debug, Clone, new)]
pub struct PullRequest {
    number: String,
    base_ref: String,
    head_ref: String,
}

impl Repository {
    /// Comment the casdiff of every digest transition in the module state files a pull
    /// request changes
    ///
    /// Only setup failures are errors. A module that cannot be analyzed, a casdiff that
    /// fails or a comment that cannot be posted is reported and skipped.
    pub async fn comment_pr_casdiff(&self, pr: &PullRequest) -> anyhow::Result<()> {
        let PullRequest {
            number,
            base_ref,
            head_ref,
        } = pr;
        writeln!(
            self.writer(),
            "Processing PR #{number} (base: {base_ref}, head: {head_ref})"
        )?;

        let git = self.git();
        let changed_files = git
            .changed_files(base_ref, head_ref)
            .await
            .context("find changed modules")?;
        let module_paths = changed_module_paths(&changed_files);
        if module_paths.is_empty() {
            writeln!(self.writer(), "No module state.json files changed in this PR")?;
            return Ok(());
        }
        writeln!(self.writer(), "Found {} changed module(s)", module_paths.len())?;

        let mut transitions = Vec::new();
        for module_path in &module_paths {
            let state_file = module_state_file(module_path);
            writeln!(self.writer(), "Analyzing {state_file}...")?;

            match state_file_transitions(&git, &state_file, base_ref, head_ref).await {
                Ok(found) if found.is_empty() => writeln!(self.writer(), "  No digest changes")?,
                Ok(found) => {
                    writeln!(self.writer(), "  Found {} digest transition(s)", found.len())?;
                    transitions.extend(found);
                }
                Err(e) => warn!("failed to analyze {state_file}: {e:#}"),
            }
        }

        if transitions.is_empty() {
            writeln!(self.writer(), "No digest transitions found")?;
            return Ok(());
        }

        writeln!(
            self.writer(),
            "\nRunning casdiff for {} transition(s)...",
            transitions.len()
        )?;
        let results = run_casdiffs(self.path(), &transitions).await;

        let mut reports = Vec::new();
        let mut failed = Vec::new();
        for (transition, result) in transitions.iter().zip(results) {
            match result {
                Ok(report) => reports.push((transition, report)),
                Err(e) => {
                    warn!(
                        "casdiff failed for {} {}->{}: {e:#}",
                        transition.module_path(),
                        transition.from_ref(),
                        transition.to_ref()
                    );
                    failed.push(transition);
                }
            }
        }

        if !reports.is_empty() {
            self.post_comments(pr, &reports).await?;
        }

        if !failed.is_empty() {
            print_failure_summary(&failed);
        }

        writeln!(self.writer(), "\nDone!")?;
        Ok(())
    }

    async fn post_comments(
        &self,
        pr: &PullRequest,
        reports: &[(&StateTransition, String)],
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "\nPosting {} comment(s) to PR...",
            reports.len()
        )?;

        let gh = self.gh();
        let repository = match gh.name_with_owner().await {
            Ok(repository) => repository,
            Err(e) => {
                warn!("failed to post comments: {e:#}");
                writeln!(self.writer(), "Successfully posted 0 comment(s)")?;
                return Ok(());
            }
        };

        let mut posted = 0;
        for (transition, report) in reports {
            let comment = ReviewComment::new(
                report.clone(),
                pr.head_ref.clone(),
                transition.file_path().to_string(),
                transition.line_number(),
            );
            match gh.post_review_comment(&repository, &pr.number, &comment).await {
                Ok(()) => posted += 1,
                Err(e) => warn!("failed to post comment: {e:#}"),
            }
        }

        info!(posted, total = reports.len(), "posted review comments");
        writeln!(self.writer(), "Successfully posted {posted} comment(s)")?;
        Ok(())
    }
}

/// Digest transitions of one module state file between two git references
async fn state_file_transitions(
    git: &Git,
    state_file: &str,
    base_ref: &str,
    head_ref: &str,
) -> anyhow::Result<Vec<StateTransition>> {
    let base_state = read_state_at(git, base_ref, state_file)
        .await
        .context("read base state")?;
    let head_state = read_state_at(git, head_ref, state_file)
        .await
        .context("read head state")?;

    let diff_output = git
        .diff_without_context(base_ref, head_ref, state_file)
        .await
        .context("get line numbers")?;
    let line_numbers = digest_line_numbers(&diff_output, appended_count(&base_state, &head_state));

    Ok(detect_transitions(
        state_file,
        &base_state,
        &head_state,
        &line_numbers,
    ))
}

async fn read_state_at(git: &Git, reference: &str, state_file: &str) -> anyhow::Result<ModuleState> {
    let content = git.show(reference, state_file).await?;

    ModuleState::read_from(content.as_slice()).context("parse module state")
}

/// Markdown casdiff of every transition, in transition order
///
/// Each diff runs on the blocking pool against its own module directory under `root`.
pub(crate) async fn run_casdiffs(
    root: &Path,
    transitions: &[StateTransition],
) -> Vec<anyhow::Result<String>> {
    let mut tasks = JoinSet::new();
    for (index, transition) in transitions.iter().enumerate() {
        let module_dir = root.join(transition.module_path());
        let from = transition.from_ref().to_string();
        let to = transition.to_ref().to_string();

        tasks.spawn_blocking(move || {
            let report = Repository::new(&module_dir, Box::new(std::io::sink()))
                .and_then(|repository| repository.diff_report(&from, &to, Format::Markdown))
                .context("casdiff failed");
            (index, report)
        });
    }

    let mut results = transitions.iter().map(|_| None).collect::<Vec<_>>();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => results[index] = Some(report),
            Err(e) => warn!("casdiff task failed: {e}"),
        }
    }

    results
        .into_iter()
        .map(|result| result.unwrap_or_else(|| Err(anyhow::anyhow!("casdiff did not complete"))))
        .collect()
}

fn print_failure_summary(failed: &[&StateTransition]) {
    eprintln!(
        "\n{}",
        format!("Summary: {} casdiff command(s) failed:", failed.len())
            .red()
            .bold()
    );
    for transition in failed {
        eprintln!(
            "  - {}: {} -> {}",
            transition.module_path(),
            transition.from_ref(),
            transition.to_ref()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn transition(module: &str, from: &str, to: &str) -> StateTransition {
        let module_path = format!("modules/sync/{module}");
        StateTransition::new(
            module_path.clone(),
            module_state_file(&module_path),
            from.to_string(),
            to.to_string(),
            String::new(),
            String::new(),
            0,
        )
    }

    #[tokio::test]
    async fn casdiffs_keep_transition_order_and_isolate_failures() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("src-v1/a.proto").write_str("message A {}\n")?;
        dir.child("src-v2/a.proto").write_str("message A { string b = 1; }\n")?;
        dir.child("src-v2/c.proto").write_str("message C {}\n")?;
        let repository = Repository::new(dir.path(), Box::new(std::io::sink()))?;
        for (src, reference) in [("src-v1", "v1"), ("src-v2", "v2")] {
            repository.mod_process("modules/sync", src, "acme", "widgets", reference)?;
        }

        let transitions = vec![
            transition("acme/widgets", "v1", "v2"),
            transition("acme/missing", "v1", "v2"),
            transition("acme/widgets", "v2", "v1"),
        ];
        let results = run_casdiffs(dir.path(), &transitions).await;

        assert_eq!(results.len(), 3);
        let forward = results[0].as_ref().map_err(|e| anyhow::anyhow!("{e:#}"))?;
        assert!(forward.starts_with(
            "> _2 files changed: 0 removed, 0 renamed, 1 added, 1 changed content_\n"
        ));
        assert!(results[1].is_err());
        let backward = results[2].as_ref().map_err(|e| anyhow::anyhow!("{e:#}"))?;
        assert!(backward.starts_with(
            "> _2 files changed: 1 removed, 0 renamed, 0 added, 1 changed content_\n"
        ));
        Ok(())
    }
}
