use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Run `program` in `dir`, feeding it `stdin`, and return its stdout
///
/// A non-zero exit is an error carrying the program's stderr.
pub(crate) async fn run_command(
    dir: &Path,
    program: &str,
    args: &[&str],
    stdin: Option<&[u8]>,
) -> anyhow::Result<Vec<u8>> {
    debug!(program, ?args, dir = %dir.display(), "running command");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("unable to start {program}"))?;

    if let Some(input) = stdin {
        let mut pipe = child
            .stdin
            .take()
            .with_context(|| format!("no stdin for {program}"))?;
        pipe.write_all(input)
            .await
            .with_context(|| format!("unable to write to {program}"))?;
    }

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("unable to wait for {program}"))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} {} failed: {} (stderr: {})",
            program,
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(output.stdout)
}

/// The git CLI on a local clone
#[derive(Debug, Clone)]
pub struct Git {
    path: Box<Path>,
}

impl Git {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Git {
            path: path.into().into_boxed_path(),
        }
    }

    async fn git(&self, args: &[&str]) -> anyhow::Result<Vec<u8>> {
        run_command(&self.path, "git", args, None).await
    }

    /// `git diff --name-only <base> <head>`
    pub async fn changed_files(&self, base: &str, head: &str) -> anyhow::Result<String> {
        let output = self
            .git(&["diff", "--name-only", base, head])
            .await
            .context("git diff")?;

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Content of `path` at `reference`
    pub async fn show(&self, reference: &str, path: &str) -> anyhow::Result<Vec<u8>> {
        self.git(&["show", &format!("{reference}:{path}")])
            .await
            .with_context(|| format!("git show {reference}:{path}"))
    }

    /// Zero-context diff of one file between two references
    pub async fn diff_without_context(
        &self,
        base: &str,
        head: &str,
        path: &str,
    ) -> anyhow::Result<String> {
        let output = self
            .git(&["diff", "-U0", base, head, "--", path])
            .await
            .context("git diff")?;

        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}
