use crate::artifacts::state::STATE_FILE_NAME;
use crate::artifacts::state::global_state::GlobalState;
use crate::artifacts::state::module_state::{ModuleReference, ModuleState};
use anyhow::Context;
use file_guard::Lock;
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default sync root, relative to the repository root
pub const SYNC_ROOT: &str = "modules/sync";
pub const CAS_DIR: &str = "cas";

/// The sync root: a global `state.json` plus one `<owner>/<repo>` directory per module
#[derive(Debug, Clone)]
pub struct SyncDir {
    path: Box<Path>,
}

impl SyncDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SyncDir {
            path: path.into().into_boxed_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn module_dir(&self, owner: &str, repo: &str) -> PathBuf {
        self.path.join(owner).join(repo)
    }

    pub fn cas_dir(&self, owner: &str, repo: &str) -> PathBuf {
        self.module_dir(owner, repo).join(CAS_DIR)
    }

    pub fn global_state_path(&self) -> PathBuf {
        self.path.join(STATE_FILE_NAME)
    }

    pub fn module_state_path(&self, owner: &str, repo: &str) -> PathBuf {
        self.module_dir(owner, repo).join(STATE_FILE_NAME)
    }

    pub fn read_global_state(&self) -> anyhow::Result<GlobalState> {
        let path = self.global_state_path();
        let file = std::fs::File::open(&path)
            .with_context(|| format!("unable to open global state file {}", path.display()))?;

        GlobalState::read_from(file)
            .with_context(|| format!("read global state file {}", path.display()))
    }

    /// State of the module named `<owner>/<repo>`, empty when it has never been synced
    pub fn read_module_state(&self, module_name: &str) -> anyhow::Result<ModuleState> {
        let path = self.path.join(module_name).join(STATE_FILE_NAME);
        let file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ModuleState::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("unable to open module state file {}", path.display()));
            }
        };

        ModuleState::read_from(file)
            .with_context(|| format!("read module state file {}", path.display()))
    }

    /// Append `reference` to the module state and make it the module's latest reference
    pub fn append_module_reference(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        digest: &str,
    ) -> anyhow::Result<()> {
        let module_state_path = self.module_state_path(owner, repo);
        Self::update_state_file(&module_state_path, |content| {
            let mut state = match content {
                Some(content) => ModuleState::read_from(content)?,
                None => ModuleState::default(),
            };
            state.push(ModuleReference::new(reference.to_string(), digest.to_string()));

            let mut out = Vec::new();
            state.write_to(&mut out)?;
            Ok(out)
        })
        .context("write module state file")?;

        let module_name = format!("{owner}/{repo}");
        Self::update_state_file(&self.global_state_path(), |content| {
            let mut state = match content {
                Some(content) => GlobalState::read_from(content)?,
                None => GlobalState::default(),
            };
            state.set_latest_reference(&module_name, reference);

            let mut out = Vec::new();
            state.write_to(&mut out)?;
            Ok(out)
        })
        .context("write global state file")?;

        info!(module = module_name, reference, digest, "appended module reference");
        Ok(())
    }

    /// Rewrite a state file under an exclusive lock
    ///
    /// `update` gets the current content, or `None` when the file is new or empty, and
    /// returns the replacement content.
    fn update_state_file(
        path: &Path,
        update: impl FnOnce(Option<&[u8]>) -> anyhow::Result<Vec<u8>>,
    ) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!("failed to create parent directories for state file at {:?}", path)
        })?)?;

        let existed = path.exists();
        let mut state_file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to open state file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut state_file, Lock::Exclusive, 0, 1)?;

        let mut content = Vec::new();
        lock.deref_mut()
            .read_to_end(&mut content)
            .with_context(|| format!("failed to read state file at {:?}", path))?;
        let current = (!content.is_empty()).then_some(content.as_slice());

        let updated = match update(current) {
            Ok(updated) => updated,
            Err(e) => {
                drop(lock);
                if !existed {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        warn!("unable to remove new state file {:?}: {remove_err}", path);
                    }
                }
                return Err(e);
            }
        };

        lock.set_len(0)?;
        lock.deref_mut().seek(SeekFrom::Start(0))?;
        lock.deref_mut()
            .write_all(&updated)
            .with_context(|| format!("failed to write state file at {:?}", path))?;

        Ok(())
    }
}
