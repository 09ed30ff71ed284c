use crate::artifacts::cas::digest::Digest;
use derive_new::new;
use std::fmt;

/// A single manifest entry binding a path to the digest of its content
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct FileNode {
    path: String,
    digest: Digest,
}

impl FileNode {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }
}

/// Same layout as a manifest line, without the trailing newline
impl fmt::Display for FileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.digest, self.path)
    }
}
