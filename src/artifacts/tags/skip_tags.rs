use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Tags never to sync, keyed by `owner/repo`
///
/// Loaded from a JSON object such as `{"protocolbuffers/protobuf": ["v3.4.1"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipTags(BTreeMap<String, BTreeSet<String>>);

impl Default for SkipTags {
    fn default() -> Self {
        SkipTags(BTreeMap::from([
            // v3.4.1 shipped without protoc attached
            (
                "protocolbuffers/protobuf".to_string(),
                BTreeSet::from(["v3.4.1".to_string()]),
            ),
            // v0.8.0 is intentionally broken
            (
                "bufbuild/protovalidate-testing".to_string(),
                BTreeSet::from(["v0.8.0".to_string()]),
            ),
        ]))
    }
}

impl SkipTags {
    pub fn empty() -> Self {
        SkipTags(BTreeMap::new())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read(path)
            .with_context(|| format!("unable to read skip tags file {}", path.display()))?;

        serde_json::from_slice(&content)
            .with_context(|| format!("invalid skip tags file {}", path.display()))
    }

    pub fn should_skip(&self, owner: &str, repo: &str, tag: &str) -> bool {
        self.0
            .get(&format!("{owner}/{repo}"))
            .is_some_and(|tags| tags.contains(tag))
    }
}
