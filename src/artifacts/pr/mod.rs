//! Pull request casdiff comments
//!
//! - `module_finder`: module state files touched by a pull request
//! - `transitions`: digest transitions between the base and head state of a module

pub mod module_finder;
pub mod transitions;

use derive_new::new;

/// A point in a module's reference history where the manifest digest changes
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct StateTransition {
    /// Module directory relative to the repository root, e.g. `modules/sync/owner/repo`
    module_path: String,
    /// The module's `state.json` relative to the repository root
    file_path: String,
    from_ref: String,
    to_ref: String,
    from_digest: String,
    to_digest: String,
    /// Line of the `"digest"` entry of `to_ref` in the head file, 0 when unknown
    line_number: usize,
}

impl StateTransition {
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn from_ref(&self) -> &str {
        &self.from_ref
    }

    pub fn to_ref(&self) -> &str {
        &self.to_ref
    }

    pub fn from_digest(&self) -> &str {
        &self.from_digest
    }

    pub fn to_digest(&self) -> &str {
        &self.to_digest
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
