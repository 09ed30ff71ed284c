use crate::artifacts::state::error::StateError;
use anyhow::Context;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};

/// A synced reference and the hex digest of its manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ModuleReference {
    #[serde(default)]
    name: String,
    #[serde(default)]
    digest: String,
}

impl ModuleReference {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Contents of `<owner>/<repo>/state.json`, oldest reference first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    references: Vec<ModuleReference>,
}

impl ModuleState {
    pub fn new(references: Vec<ModuleReference>) -> Self {
        ModuleState { references }
    }

    pub fn read_from(reader: impl Read) -> anyhow::Result<Self> {
        let state: Self = serde_json::from_reader(reader).context("read file")?;
        state.validate().context("invalid module state")?;

        Ok(state)
    }

    pub fn write_to(&self, mut writer: impl Write) -> anyhow::Result<()> {
        self.validate().context("invalid module state")?;

        serde_json::to_writer_pretty(&mut writer, self).context("json marshal state")?;
        writer.flush().context("write to file")
    }

    pub fn validate(&self) -> Result<(), StateError> {
        let mut names = HashSet::with_capacity(self.references.len());

        for (i, reference) in self.references.iter().enumerate() {
            if reference.name.is_empty() {
                return Err(StateError::required(format!("references[{i}].name")));
            }
            if reference.digest.is_empty() {
                return Err(StateError::required(format!("references[{i}].digest")));
            }
            if !names.insert(reference.name.as_str()) {
                return Err(StateError::DuplicateReference(reference.name.clone()));
            }
        }

        Ok(())
    }

    pub fn references(&self) -> &[ModuleReference] {
        &self.references
    }

    pub fn push(&mut self, reference: ModuleReference) {
        self.references.push(reference);
    }

    /// First reference with the given name
    pub fn find(&self, name: &str) -> Option<&ModuleReference> {
        self.references.iter().find(|reference| reference.name == name)
    }

    pub fn last(&self) -> Option<&ModuleReference> {
        self.references.last()
    }
}
