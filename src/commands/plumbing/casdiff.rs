use crate::areas::blob_store::BlobStore;
use crate::areas::repository::Repository;
use crate::artifacts::cas::manifest::Manifest;
use crate::artifacts::core::UsageError;
use crate::artifacts::diff::manifest_diff::ManifestDiff;
use crate::artifacts::diff::report::Format;
use crate::artifacts::state::module_state::{ModuleReference, ModuleState};
use anyhow::Context;
use tracing::{debug, info};

impl Repository {
    pub fn casdiff(&self, from: &str, to: &str, format: Format) -> anyhow::Result<()> {
        let report = self.diff_report(from, to, format)?;
        write!(self.writer(), "{}", report)?;

        Ok(())
    }

    /// Strict casdiff: `from` and `to` must differ and the report is always markdown
    pub fn diff(&self, from: &str, to: &str) -> anyhow::Result<()> {
        if from == to {
            return Err(UsageError::SameFromAndTo.into());
        }

        self.casdiff(from, to, Format::Markdown)
    }

    /// Rendered diff between two references of the module in the repository directory
    ///
    /// Without a `state.json`, `from` and `to` are manifest paths relative to the
    /// directory. Otherwise they are reference names resolved to manifest digests and
    /// blobs are read from `cas/`.
    pub fn diff_report(&self, from: &str, to: &str, format: Format) -> anyhow::Result<String> {
        Ok(self.manifest_diff(from, to)?.render(format))
    }

    fn manifest_diff(&self, from: &str, to: &str) -> anyhow::Result<ManifestDiff> {
        if from == to {
            return Ok(ManifestDiff::default());
        }

        let state_path = self.module_state_path();
        let state_file = match std::fs::File::open(&state_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(from, to, "no module state file, diffing manifest paths");
                return diff_from_store(&self.store(), from, to).context("calculate cas diff");
            }
            Err(e) => return Err(e).context("read module state file"),
        };
        let module_state = ModuleState::read_from(state_file).context("read module state")?;

        let from_digest = module_state
            .find(from)
            .map(ModuleReference::digest)
            .with_context(|| format!("from reference {from} not found in the module state file"))?;
        let to_digest = module_state
            .find(to)
            .map(ModuleReference::digest)
            .with_context(|| format!("to reference {to} not found in the module state file"))?;

        if from_digest == to_digest {
            info!(from, to, "references share a manifest");
            return Ok(ManifestDiff::default());
        }

        diff_from_store(&self.cas_store(), from_digest, to_digest)
            .context("calculate cas diff from state references")
    }
}

fn diff_from_store(
    store: &dyn BlobStore,
    from_manifest_path: &str,
    to_manifest_path: &str,
) -> anyhow::Result<ManifestDiff> {
    if from_manifest_path == to_manifest_path {
        return Ok(ManifestDiff::default());
    }

    let from_manifest = read_manifest(store, from_manifest_path).context("read manifest from")?;
    let to_manifest = read_manifest(store, to_manifest_path).context("read manifest to")?;

    ManifestDiff::build(&from_manifest, &to_manifest, store)
}

fn read_manifest(store: &dyn BlobStore, path: &str) -> anyhow::Result<Manifest> {
    let data = store.read_path(path).context("read path")?;
    let content = std::str::from_utf8(&data).context("manifest is not valid UTF-8")?;

    Manifest::parse(content).context("parse manifest")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::sync_dir::SyncDir;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    /// Sync root with `acme/widgets` processed at `v1` and `v2`
    #[fixture]
    fn synced_module() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        let v1 = dir.child("src-v1");
        v1.child("to_remove.txt").write_str("gone\n").expect("write");
        v1.child("changes.txt").write_str("one\ntwo\n").expect("write");
        v1.child("keep.txt").write_str("same\n").expect("write");
        let v2 = dir.child("src-v2");
        v2.child("changes.txt").write_str("one\n2\n").expect("write");
        v2.child("keep.txt").write_str("same\n").expect("write");
        v2.child("added.txt").write_str("new\n").expect("write");

        let repository = Repository::new(dir.path(), Box::new(std::io::sink())).expect("repository");
        for (src, reference) in [("src-v1", "v1"), ("src-v2", "v2"), ("src-v2", "v2-again")] {
            repository
                .mod_process("sync", src, "acme", "widgets", reference)
                .expect("mod process");
        }
        dir
    }

    fn module_repository(dir: &TempDir) -> Repository {
        let module_dir = SyncDir::new(dir.path().join("sync")).module_dir("acme", "widgets");
        Repository::new(module_dir, Box::new(std::io::sink())).expect("repository")
    }

    #[rstest]
    fn text_report_between_state_references(synced_module: TempDir) -> anyhow::Result<()> {
        let report = module_repository(&synced_module).diff_report("v1", "v2", Format::Text)?;

        assert!(report.starts_with(
            "3 files changed: 1 removed, 0 renamed, 1 added, 1 changed content\n"
        ));
        assert!(report.contains("\nFiles removed:\n\n- shake256:"));
        assert!(report.contains("  to_remove.txt\n"));
        assert!(report.contains("  added.txt\n"));
        assert!(report.contains(" one\n-two\n+2\n"));
        Ok(())
    }

    #[rstest]
    #[case::same_reference("v1", "v1")]
    #[case::same_manifest("v2", "v2-again")]
    fn identical_snapshots_give_the_empty_report(
        synced_module: TempDir,
        #[case] from: &str,
        #[case] to: &str,
    ) -> anyhow::Result<()> {
        let report = module_repository(&synced_module).diff_report(from, to, Format::Text)?;

        assert_eq!(
            report,
            "0 files changed: 0 removed, 0 renamed, 0 added, 0 changed content\n"
        );
        Ok(())
    }

    #[rstest]
    #[case::from("nope", "v2", "from reference nope not found in the module state file")]
    #[case::to("v1", "nope", "to reference nope not found in the module state file")]
    fn unknown_references(
        synced_module: TempDir,
        #[case] from: &str,
        #[case] to: &str,
        #[case] message: &str,
    ) {
        let err = module_repository(&synced_module)
            .diff_report(from, to, Format::Markdown)
            .expect_err("unknown reference");

        assert_eq!(err.to_string(), message);
    }

    #[rstest]
    fn manifest_paths_without_a_state_file(synced_module: TempDir) -> anyhow::Result<()> {
        let module_repository = module_repository(&synced_module);
        let state = ModuleState::read_from(std::fs::File::open(
            module_repository.module_state_path(),
        )?)?;
        let cas_dir = module_repository.path().join("cas");
        let cas = Repository::new(&cas_dir, Box::new(std::io::sink()))?;

        let from = state.find("v1").map(ModuleReference::digest).unwrap_or_default();
        let to = state.find("v2").map(ModuleReference::digest).unwrap_or_default();
        let report = cas.diff_report(from, to, Format::Markdown)?;

        assert!(report.starts_with(
            "> _3 files changed: 1 removed, 0 renamed, 1 added, 1 changed content_\n"
        ));
        Ok(())
    }

    #[rstest]
    fn strict_diff_rejects_identical_references(synced_module: TempDir) {
        let err = module_repository(&synced_module)
            .diff("v1", "v1")
            .expect_err("same from and to");

        assert!(err.downcast_ref::<UsageError>().is_some());
    }
}
