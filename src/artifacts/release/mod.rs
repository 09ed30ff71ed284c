//! Release planning
//!
//! - `plan`: per-module release status against the previous release
//! - `body`: markdown body of a release
//! - `name`: date based release names (`YYYYMMDD.N`)

pub mod body;
pub mod name;
pub mod plan;

use crate::artifacts::state::module_state::ModuleReference;
use derive_new::new;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReleaseStatus {
    New,
    Updated,
    Unchanged,
    Removed,
}

/// A module's status in the next release and the references it brings
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ReleaseModuleState {
    status: ReleaseStatus,
    references: Vec<ModuleReference>,
}

impl ReleaseModuleState {
    pub fn status(&self) -> ReleaseStatus {
        self.status
    }

    pub fn references(&self) -> &[ModuleReference] {
        &self.references
    }
}
