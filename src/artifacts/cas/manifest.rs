//! Manifests
//!
//! A manifest is a snapshot of a file tree: every path mapped to the digest of its
//! content. Manifests are themselves stored as blobs, using a line oriented format:
//!
//! ```text
//! shake256:<hex>  path/to/a.proto
//! shake256:<hex>  path/to/b.proto
//! ```
//!
//! Lines are sorted by path and each one ends with `\n`. The manifest digest is the
//! digest of this text.

use crate::artifacts::cas::blob::Blob;
use crate::artifacts::cas::digest::Digest;
use crate::artifacts::cas::file_node::FileNode;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("line {line}: expected \"<digest>  <path>\", got {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("line {line}: invalid digest: {reason}")]
    InvalidDigest { line: usize, reason: String },
    #[error("line {line}: empty path")]
    EmptyPath { line: usize },
    #[error("duplicate path {0:?}")]
    DuplicatePath(String),
}

/// Path-sorted collection of file nodes, one per unique path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    file_nodes: BTreeMap<String, FileNode>,
}

impl Manifest {
    pub fn new(file_nodes: impl IntoIterator<Item = FileNode>) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();
        for file_node in file_nodes {
            manifest.insert(file_node)?;
        }
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let mut manifest = Self::default();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            if line.is_empty() {
                continue;
            }

            let (digest, path) =
                line.split_once("  ")
                    .ok_or_else(|| ManifestError::MalformedLine {
                        line: line_number,
                        content: line.to_string(),
                    })?;
            let digest = digest
                .parse::<Digest>()
                .map_err(|e| ManifestError::InvalidDigest {
                    line: line_number,
                    reason: e.to_string(),
                })?;
            if path.is_empty() {
                return Err(ManifestError::EmptyPath { line: line_number });
            }

            manifest.insert(FileNode::new(path.to_string(), digest))?;
        }

        Ok(manifest)
    }

    fn insert(&mut self, file_node: FileNode) -> Result<(), ManifestError> {
        match self.file_nodes.entry(file_node.path().to_string()) {
            Entry::Occupied(entry) => Err(ManifestError::DuplicatePath(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(file_node);
                Ok(())
            }
        }
    }

    /// All file nodes, in ascending path order
    pub fn file_nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.file_nodes.values()
    }

    pub fn get_file_node(&self, path: &str) -> Option<&FileNode> {
        self.file_nodes.get(path)
    }

    pub fn len(&self) -> usize {
        self.file_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_nodes.is_empty()
    }

    pub fn serialize(&self) -> String {
        self.file_nodes
            .values()
            .map(|file_node| format!("{file_node}\n"))
            .collect()
    }

    pub fn to_blob(&self) -> Blob {
        Blob::from_content(Bytes::from(self.serialize()))
    }

    pub fn digest(&self) -> Digest {
        self.to_blob().digest().clone()
    }
}
