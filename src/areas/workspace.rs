use crate::artifacts::cas::blob::FileSet;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

const IGNORED_PATHS: [&str; 1] = [".git"];

/// A module source tree on disk
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Workspace {
            path: path.into().into_boxed_path(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && IGNORED_PATHS
                .iter()
                .any(|ignored| entry.file_name() == *ignored)
    }

    /// Relative `/`-separated paths of every regular file, in sorted order
    ///
    /// Ignored directories are not descended into. A path that is not UTF-8 is an error.
    pub fn list_files(&self) -> anyhow::Result<Vec<String>> {
        if !self.path.is_dir() {
            anyhow::bail!("The specified path is not a directory: {:?}", self.path);
        }

        let mut files = Vec::new();
        let entries = WalkDir::new(&self.path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_ignored(entry));
        for entry in entries {
            let entry = entry.with_context(|| format!("Unable to walk {:?}", self.path))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .with_context(|| format!("Invalid workspace path {:?}", entry.path()))?;
            let relative = relative
                .components()
                .map(|component| {
                    component
                        .as_os_str()
                        .to_str()
                        .with_context(|| format!("Path is not valid UTF-8: {:?}", entry.path()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?
                .join("/");
            files.push(relative);
        }

        files.sort();
        Ok(files)
    }

    pub fn read_file(&self, file_path: &str) -> anyhow::Result<Bytes> {
        let full_path = self.path.join(file_path);

        std::fs::read(&full_path)
            .map(Bytes::from)
            .with_context(|| format!("Unable to read file {:?}", full_path))
    }

    /// Manifest and blobs of the whole tree
    pub fn file_set(&self) -> anyhow::Result<FileSet> {
        let files = self
            .list_files()?
            .into_iter()
            .map(|path| {
                let content = self.read_file(&path)?;
                debug!(path, size = content.len(), "read source file");
                Ok((path, content))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        FileSet::from_files(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_nested_files_and_skips_git() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("b.proto").write_str("b")?;
        dir.child("foo/bar/a.proto").write_str("a")?;
        dir.child(".git/HEAD").write_str("ref: refs/heads/main")?;
        dir.child("empty").create_dir_all()?;

        let files = Workspace::new(dir.path()).list_files()?;

        assert_eq!(files, vec!["b.proto", "foo/bar/a.proto"]);
        Ok(())
    }

    #[test]
    fn nested_git_directories_are_skipped() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("vendor/dep/.git/config").write_str("[core]")?;
        dir.child("vendor/dep/dep.proto").write_str("d")?;

        let files = Workspace::new(dir.path()).list_files()?;

        assert_eq!(files, vec!["vendor/dep/dep.proto"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_rejected() -> anyhow::Result<()> {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new()?;
        dir.child("ok.proto").write_str("ok")?;
        let name = std::ffi::OsStr::from_bytes(b"bad\xff.proto");
        std::fs::write(dir.path().join(name), "bad")?;

        let err = Workspace::new(dir.path())
            .list_files()
            .expect_err("non UTF-8 file name");

        assert!(err.to_string().starts_with("Path is not valid UTF-8"));
        Ok(())
    }

    #[test]
    fn file_set_covers_every_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        dir.child("a.proto").write_str("same")?;
        dir.child("x/b.proto").write_str("same")?;

        let file_set = Workspace::new(dir.path()).file_set()?;

        assert_eq!(file_set.manifest().len(), 2);
        assert_eq!(file_set.blob_set().len(), 1);
        Ok(())
    }

    #[test]
    fn missing_directory_is_an_error() {
        let workspace = Workspace::new("/definitely/not/here");

        assert!(workspace.list_files().is_err());
    }
}
