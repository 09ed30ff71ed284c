use crate::areas::github::{Release, ReleaseHost};
use crate::areas::repository::Repository;
use crate::areas::sync_dir::SyncDir;
use crate::artifacts::release::body::release_body;
use crate::artifacts::release::name::next_release_name;
use crate::artifacts::release::plan::{calculate_module_states, latest_references, should_release};
use crate::artifacts::state::STATE_FILE_NAME;
use crate::artifacts::state::global_state::GlobalState;
use anyhow::Context;
use bytes::Bytes;
use chrono::Utc;
use tracing::info;

const RELEASE_FILE_NAME: &str = "RELEASE.md";

impl Repository {
    /// Cut a release of every module synced under `directory` since the latest release
    pub async fn release(
        &self,
        github: &dyn ReleaseHost,
        directory: &str,
        owner: &str,
        repo: &str,
        dry_run: bool,
    ) -> anyhow::Result<()> {
        let sync_dir = SyncDir::new(self.resolve(directory));

        let previous_release = github
            .latest_release(owner, repo)
            .await
            .context("retrieve latest release")?;
        let previous_state = match &previous_release {
            Some(release) => Some(download_release_state(github, owner, repo, release).await?),
            None => None,
        };
        let current_state = if sync_dir.global_state_path().exists() {
            Some(sync_dir.read_global_state().context("read local state file")?)
        } else {
            None
        };

        let states = calculate_module_states(
            &sync_dir,
            &latest_references(previous_state.as_ref()),
            &latest_references(current_state.as_ref()),
        )
        .context("produce new module list")?;

        let previous_tag = previous_release.as_ref().map(|release| release.tag_name.as_str());
        if !should_release(&states) {
            match previous_tag {
                Some(tag) => writeln!(self.writer(), "no changes to modules since {tag}")?,
                None => writeln!(
                    self.writer(),
                    "no changes to modules - not creating initial release"
                )?,
            }
            return Ok(());
        }

        let name = next_release_name(Utc::now(), previous_tag)
            .context("determine next release name")?;
        let body = release_body(&name, &states);
        info!(name, modules = states.len(), dry_run, "release planned");

        if dry_run {
            let dir = tempfile::Builder::new()
                .prefix("modules-release")
                .tempdir()
                .context("create temporary directory")?
                .keep();
            std::fs::write(dir.join(RELEASE_FILE_NAME), &body)
                .with_context(|| format!("write {RELEASE_FILE_NAME}"))?;

            writeln!(self.writer(), "skipping GitHub release creation in dry-run mode")?;
            writeln!(
                self.writer(),
                "release assets created in {:?}",
                dir.display().to_string()
            )?;
            return Ok(());
        }

        let global_state = std::fs::read(sync_dir.global_state_path())
            .context("read global state file")?;
        self.publish(github, owner, repo, &name, &body, Bytes::from(global_state))
            .await
            .context("create GitHub release")
    }

    /// Create `name` as a draft, attach the global state and publish it
    async fn publish(
        &self,
        github: &dyn ReleaseHost,
        owner: &str,
        repo: &str,
        name: &str,
        body: &str,
        global_state: Bytes,
    ) -> anyhow::Result<()> {
        let release = github.create_release(owner, repo, name, body, true).await?;
        github
            .upload_release_asset(owner, repo, release.id, STATE_FILE_NAME, global_state)
            .await?;
        github.publish_release(owner, repo, release.id).await?;

        writeln!(self.writer(), "created release {name}")?;
        Ok(())
    }
}

async fn download_release_state(
    github: &dyn ReleaseHost,
    owner: &str,
    repo: &str,
    release: &Release,
) -> anyhow::Result<GlobalState> {
    let asset = release.asset(STATE_FILE_NAME).with_context(|| {
        format!("release {} has no {STATE_FILE_NAME} asset", release.tag_name)
    })?;
    let content = github
        .download_release_asset(owner, repo, asset)
        .await
        .context("download release state")?;

    GlobalState::read_from(content.as_ref()).context("read release state")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::github::fake::{CREATED_RELEASE_ID, FakeReleaseHost};
    use crate::areas::repository::testing::SharedBuffer;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const PREVIOUS_STATE: &str = r#"{
  "modules": [
    {"module_name": "envoyproxy/envoy", "latest_reference": "bb554f53"},
    {"module_name": "old/bar", "latest_reference": "ref2"}
  ]
}"#;

    #[fixture]
    fn sync_root() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        let sync_dir = SyncDir::new(dir.path().join("sync"));
        for (owner, repo, name, digest) in [
            ("envoyproxy", "envoy", "bb554f53", "aaa"),
            ("envoyproxy", "envoy", "7850b6bb", "bbb"),
            ("new", "foo", "ref3", "ccc"),
        ] {
            sync_dir
                .append_module_reference(owner, repo, name, digest)
                .expect("append reference");
        }
        dir
    }

    fn repository(dir: &TempDir) -> (Repository, SharedBuffer) {
        let output = SharedBuffer::default();
        let repository =
            Repository::new(dir.path(), Box::new(output.clone())).expect("repository");
        (repository, output)
    }

    #[rstest]
    #[tokio::test]
    async fn release_is_created_as_draft_then_published(sync_root: TempDir) -> anyhow::Result<()> {
        let (repository, output) = repository(&sync_root);
        let github = FakeReleaseHost::with_latest("20000101.1", PREVIOUS_STATE);

        repository
            .release(&github, "sync", "bufbuild", "modules", false)
            .await?;

        let name = next_release_name(Utc::now(), Some("20000101.1"))?;
        assert_eq!(
            github.calls(),
            vec![
                format!("create {name} draft=true"),
                format!("upload state.json to {CREATED_RELEASE_ID}"),
                format!("publish {CREATED_RELEASE_ID}"),
            ]
        );
        let uploads = github.uploads();
        let uploaded_state = GlobalState::read_from(uploads[0].1.as_ref())?;
        assert_eq!(
            uploaded_state.find("new/foo").map(|m| m.latest_reference()),
            Some("ref3")
        );
        assert_eq!(output.contents(), format!("created release {name}\n"));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn dry_run_writes_the_body_and_touches_nothing(sync_root: TempDir) -> anyhow::Result<()> {
        let (repository, output) = repository(&sync_root);
        let github = FakeReleaseHost::with_latest("20000101.1", PREVIOUS_STATE);

        repository
            .release(&github, "sync", "bufbuild", "modules", true)
            .await?;

        assert!(github.calls().is_empty());
        let output = output.contents();
        let dir = output
            .lines()
            .last()
            .and_then(|line| line.strip_prefix("release assets created in \""))
            .and_then(|line| line.strip_suffix('"'))
            .expect("release directory");
        let body = std::fs::read_to_string(std::path::Path::new(dir).join(RELEASE_FILE_NAME))?;
        assert!(body.contains("## New Modules"));
        assert!(body.contains("<details><summary>new/foo: 1 update(s)</summary>"));
        assert!(body.contains("<details><summary>envoyproxy/envoy: 1 update(s)</summary>"));
        assert!(body.contains("## Removed Modules"));
        assert!(body.contains("- old/bar\n"));
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn nothing_to_release(sync_root: TempDir) -> anyhow::Result<()> {
        let (repository, output) = repository(&sync_root);
        let github = FakeReleaseHost::with_latest(
            "20230519.3",
            r#"{"modules":[{"module_name":"envoyproxy/envoy","latest_reference":"7850b6bb"},{"module_name":"new/foo","latest_reference":"ref3"}]}"#,
        );

        repository
            .release(&github, "sync", "bufbuild", "modules", false)
            .await?;

        assert!(github.calls().is_empty());
        assert_eq!(output.contents(), "no changes to modules since 20230519.3\n");
        Ok(())
    }

    #[tokio::test]
    async fn nothing_to_release_initially() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let (repository, output) = repository(&dir);
        let github = FakeReleaseHost::default();

        repository
            .release(&github, "sync", "bufbuild", "modules", false)
            .await?;

        assert_eq!(
            output.contents(),
            "no changes to modules - not creating initial release\n"
        );
        Ok(())
    }
}
