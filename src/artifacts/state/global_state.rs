use crate::artifacts::state::error::StateError;
use anyhow::Context;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct GlobalStateReference {
    #[serde(default, alias = "moduleName")]
    module_name: String,
    #[serde(default, alias = "latestReference")]
    latest_reference: String,
}

impl GlobalStateReference {
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn latest_reference(&self) -> &str {
        &self.latest_reference
    }
}

/// Contents of the sync root `state.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    modules: Vec<GlobalStateReference>,
}

impl GlobalState {
    pub fn new(modules: Vec<GlobalStateReference>) -> Self {
        GlobalState { modules }
    }

    pub fn read_from(reader: impl Read) -> anyhow::Result<Self> {
        let state: Self = serde_json::from_reader(reader).context("read file")?;
        state.validate().context("invalid global state")?;

        Ok(state)
    }

    /// Write the state with modules sorted by name
    pub fn write_to(&self, mut writer: impl Write) -> anyhow::Result<()> {
        self.validate().context("invalid global state")?;

        let mut sorted = self.clone();
        sorted
            .modules
            .sort_by(|a, b| a.module_name.cmp(&b.module_name));

        serde_json::to_writer_pretty(&mut writer, &sorted).context("json marshal state")?;
        writer.flush().context("write to file")
    }

    pub fn validate(&self) -> Result<(), StateError> {
        let mut names = HashSet::with_capacity(self.modules.len());

        for (i, module) in self.modules.iter().enumerate() {
            if module.module_name.is_empty() {
                return Err(StateError::required(format!("modules[{i}].module_name")));
            }
            if module.latest_reference.is_empty() {
                return Err(StateError::required(format!(
                    "modules[{i}].latest_reference"
                )));
            }
            if !names.insert(module.module_name.as_str()) {
                return Err(StateError::DuplicateModule(module.module_name.clone()));
            }
        }

        Ok(())
    }

    pub fn modules(&self) -> &[GlobalStateReference] {
        &self.modules
    }

    pub fn find(&self, module_name: &str) -> Option<&GlobalStateReference> {
        self.modules
            .iter()
            .find(|module| module.module_name == module_name)
    }

    /// Point `module_name` at `reference`, adding the module when missing
    pub fn set_latest_reference(&mut self, module_name: &str, reference: &str) {
        match self
            .modules
            .iter_mut()
            .find(|module| module.module_name == module_name)
        {
            Some(module) => module.latest_reference = reference.to_string(),
            None => self.modules.push(GlobalStateReference::new(
                module_name.to_string(),
                reference.to_string(),
            )),
        }
    }
}
