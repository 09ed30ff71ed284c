use crate::areas::blob_store::{BlobStore, DirBlobStore, PutOutcome};
use crate::areas::repository::Repository;
use crate::areas::sync_dir::{CAS_DIR, SyncDir};
use crate::areas::workspace::Workspace;
use anyhow::Context;
use std::path::Path;
use tracing::info;

impl Repository {
    /// Store `src_dir` as CAS blobs of module `owner/repo` and record it as `reference`
    pub fn mod_process(
        &self,
        root_sync_dir: &str,
        src_dir: &str,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> anyhow::Result<()> {
        let sync_dir = SyncDir::new(self.resolve(root_sync_dir));
        let manifest_hex = self
            .convert_to_cas(&sync_dir, root_sync_dir, src_dir, owner, repo)
            .context("convert module to CAS")?;

        sync_dir
            .append_module_reference(owner, repo, reference, &manifest_hex)
            .context("update mod reference")?;

        Ok(())
    }

    fn convert_to_cas(
        &self,
        sync_dir: &SyncDir,
        root_sync_dir: &str,
        src_dir: &str,
        owner: &str,
        repo: &str,
    ) -> anyhow::Result<String> {
        let file_set = Workspace::new(self.resolve(src_dir))
            .file_set()
            .context("new manifest from source directory")?;
        let manifest_blob = file_set.manifest().to_blob();

        let store = DirBlobStore::new(sync_dir.cas_dir(owner, repo));
        let display_dir = Path::new(root_sync_dir).join(owner).join(repo).join(CAS_DIR);

        let mut written = 0;
        for blob in std::iter::once(&manifest_blob).chain(file_set.blob_set().blobs()) {
            let hex = blob.digest().hex();
            let display_path = display_dir.join(&hex).display().to_string();

            match store
                .put_path(&hex, blob.content().clone())
                .with_context(|| format!("write blob {:?} to file", hex))?
            {
                PutOutcome::Written => {
                    written += 1;
                    writeln!(self.writer(), "blob written {:?}", display_path)?
                }
                PutOutcome::Skipped => {
                    writeln!(self.writer(), "skipping existing blob {:?}", display_path)?
                }
            }
        }

        info!(
            module = format!("{owner}/{repo}"),
            files = file_set.manifest().len(),
            written,
            "module converted to CAS"
        );
        Ok(manifest_blob.digest().hex())
    }
}
