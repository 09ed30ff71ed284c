use crate::areas::blob_store::DirBlobStore;
use crate::areas::gh::GhCli;
use crate::areas::git::Git;
use crate::areas::sync_dir::CAS_DIR;
use crate::artifacts::state::STATE_FILE_NAME;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::path::{Path, PathBuf};

/// The directory a command runs in, plus where its output goes
///
/// For `casdiff` this is a module directory holding `state.json` and `cas/`; for the
/// pipeline commands it is the root of the modules repository.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
}

impl Repository {
    pub fn new(path: impl AsRef<Path>, writer: Box<dyn std::io::Write>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let path = path
            .canonicalize()
            .with_context(|| format!("unable to resolve directory {}", path.display()))?;

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    /// Resolve `path` against the repository directory
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.path.join(path)
    }

    pub fn module_state_path(&self) -> PathBuf {
        self.path.join(STATE_FILE_NAME)
    }

    /// Blobs stored directly in the repository directory
    pub fn store(&self) -> DirBlobStore {
        DirBlobStore::new(self.path.to_path_buf())
    }

    /// Blobs of the module checked out in the repository directory
    pub fn cas_store(&self) -> DirBlobStore {
        DirBlobStore::new(self.path.join(CAS_DIR))
    }

    pub fn git(&self) -> Git {
        Git::new(self.path.to_path_buf())
    }

    pub fn gh(&self) -> GhCli {
        GhCli::new(self.path.to_path_buf())
    }
}
