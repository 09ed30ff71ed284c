//! Manifest comparison with content-addressed rename detection
//!
//! Every path of two manifests lands in at most one bucket:
//!
//! - `removed`: only in `from`
//! - `added`: only in `to`
//! - `renamed`: a removed and an added path sharing a digest
//! - `changed_content`: same path, different digest
//!
//! Rename candidates are paired greedily per digest, i-th removed path with i-th
//! added path, both in ascending order. Surplus paths stay removed or added.

use crate::areas::blob_store::BlobStore;
use crate::artifacts::cas::digest::Digest;
use crate::artifacts::cas::file_node::FileNode;
use crate::artifacts::cas::manifest::Manifest;
use crate::artifacts::diff::unified::unified_diff;
use anyhow::Context;
use derive_new::new;
use std::collections::BTreeMap;
use tracing::debug;

/// A path pair whose content or location changed
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FileChange {
    from: FileNode,
    to: FileNode,
    diff: String,
}

impl FileChange {
    pub fn from(&self) -> &FileNode {
        &self.from
    }

    pub fn to(&self) -> &FileNode {
        &self.to
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    added: BTreeMap<String, FileNode>,
    removed: BTreeMap<String, FileNode>,
    // keyed by the from path
    renamed: BTreeMap<String, FileChange>,
    changed_content: BTreeMap<String, FileChange>,
}

impl ManifestDiff {
    pub fn build(from: &Manifest, to: &Manifest, store: &dyn BlobStore) -> anyhow::Result<Self> {
        let mut diff = Self::default();
        if from == to {
            return Ok(diff);
        }

        let mut digest_to_removed_paths: BTreeMap<Digest, Vec<String>> = BTreeMap::new();
        let mut digest_to_added_paths: BTreeMap<Digest, Vec<String>> = BTreeMap::new();

        for from_node in from.file_nodes() {
            let path = from_node.path();
            let Some(to_node) = to.get_file_node(path) else {
                diff.removed.insert(path.to_string(), from_node.clone());
                digest_to_removed_paths
                    .entry(from_node.digest().clone())
                    .or_default()
                    .push(path.to_string());
                continue;
            };

            if from_node.digest() == to_node.digest() {
                continue;
            }

            let content_diff = Self::content_diff(from_node, to_node, store).with_context(|| {
                format!("changed digest from {} to {}", from_node, to_node)
            })?;
            debug!(path, "changed content");
            diff.changed_content.insert(
                path.to_string(),
                FileChange::new(from_node.clone(), to_node.clone(), content_diff),
            );
        }

        for to_node in to.file_nodes() {
            if from.get_file_node(to_node.path()).is_none() {
                diff.added.insert(to_node.path().to_string(), to_node.clone());
                digest_to_added_paths
                    .entry(to_node.digest().clone())
                    .or_default()
                    .push(to_node.path().to_string());
            }
        }

        for (digest, removed_paths) in &digest_to_removed_paths {
            let Some(added_paths) = digest_to_added_paths.get(digest) else {
                continue;
            };

            for (from_path, to_path) in removed_paths.iter().zip(added_paths) {
                let (Some(from_node), Some(to_node)) =
                    (diff.removed.remove(from_path), diff.added.remove(to_path))
                else {
                    continue;
                };

                debug!(from = from_path, to = to_path, "renamed");
                diff.renamed.insert(
                    from_path.clone(),
                    FileChange::new(from_node, to_node, String::new()),
                );
            }
        }

        Ok(diff)
    }

    fn content_diff(
        from: &FileNode,
        to: &FileNode,
        store: &dyn BlobStore,
    ) -> anyhow::Result<String> {
        let from_data = store
            .read_path(&from.digest().hex())
            .context("read from path")?;
        let to_data = store.read_path(&to.digest().hex()).context("read to path")?;

        Ok(unified_diff(
            &from_data,
            &to_data,
            &from.to_string(),
            &to.to_string(),
        ))
    }

    pub fn added(&self) -> &BTreeMap<String, FileNode> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeMap<String, FileNode> {
        &self.removed
    }

    pub fn renamed(&self) -> &BTreeMap<String, FileChange> {
        &self.renamed
    }

    pub fn changed_content(&self) -> &BTreeMap<String, FileChange> {
        &self.changed_content
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.renamed.len() + self.changed_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
