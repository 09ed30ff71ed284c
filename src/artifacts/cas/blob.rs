use crate::artifacts::cas::digest::Digest;
use crate::artifacts::cas::file_node::FileNode;
use crate::artifacts::cas::manifest::Manifest;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Raw content together with its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    digest: Digest,
    content: Bytes,
}

impl Blob {
    pub fn from_content(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let digest = Digest::of_content(&content);

        Self { digest, content }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

/// Blobs deduplicated by digest, iterated in digest order
#[derive(Debug, Clone, Default)]
pub struct BlobSet {
    blobs: BTreeMap<Digest, Blob>,
}

impl BlobSet {
    pub fn insert(&mut self, blob: Blob) {
        self.blobs.entry(blob.digest().clone()).or_insert(blob);
    }

    pub fn get(&self, digest: &Digest) -> Option<&Blob> {
        self.blobs.get(digest)
    }

    pub fn blobs(&self) -> impl Iterator<Item = &Blob> {
        self.blobs.values()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// A manifest plus the content of every file it references
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    manifest: Manifest,
    blob_set: BlobSet,
}

impl FileSet {
    /// Build a file set from `(path, content)` pairs
    pub fn from_files(
        files: impl IntoIterator<Item = (String, Bytes)>,
    ) -> anyhow::Result<Self> {
        let mut blob_set = BlobSet::default();
        let mut file_nodes = Vec::new();

        for (path, content) in files {
            let blob = Blob::from_content(content);
            file_nodes.push(FileNode::new(path, blob.digest().clone()));
            blob_set.insert(blob);
        }

        Ok(Self {
            manifest: Manifest::new(file_nodes)?,
            blob_set,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn blob_set(&self) -> &BlobSet {
        &self.blob_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_contents_share_a_single_blob() -> anyhow::Result<()> {
        let file_set = FileSet::from_files([
            ("a.txt".to_string(), Bytes::from_static(b"same")),
            ("b.txt".to_string(), Bytes::from_static(b"same")),
            ("c.txt".to_string(), Bytes::from_static(b"other")),
        ])?;

        assert_eq!(file_set.manifest().len(), 3);
        assert_eq!(file_set.blob_set().len(), 2);

        let a = file_set.manifest().get_file_node("a.txt").map(FileNode::digest);
        let b = file_set.manifest().get_file_node("b.txt").map(FileNode::digest);
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn every_file_node_has_its_blob() -> anyhow::Result<()> {
        let file_set = FileSet::from_files([
            ("x/1.proto".to_string(), Bytes::from_static(b"one")),
            ("x/2.proto".to_string(), Bytes::from_static(b"two")),
        ])?;

        for file_node in file_set.manifest().file_nodes() {
            let blob = file_set
                .blob_set()
                .get(file_node.digest())
                .expect("blob for file node");
            assert_eq!(blob.digest(), file_node.digest());
        }
        Ok(())
    }
}
