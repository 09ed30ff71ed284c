use crate::areas::sync_dir::SyncDir;
use crate::artifacts::release::{ReleaseModuleState, ReleaseStatus};
use crate::artifacts::state::global_state::GlobalState;
use anyhow::Context;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Module name to latest reference
pub fn latest_references(state: Option<&GlobalState>) -> BTreeMap<String, String> {
    state
        .map(|state| {
            state
                .modules()
                .iter()
                .map(|module| {
                    (
                        module.module_name().to_string(),
                        module.latest_reference().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Release status of every module known to either release
///
/// Without a previous release every current module is new. Updated modules carry the
/// references synced after the previously released one.
pub fn calculate_module_states(
    sync_dir: &SyncDir,
    previous: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> anyhow::Result<BTreeMap<String, ReleaseModuleState>> {
    let mut states = BTreeMap::new();

    for (module_name, current_reference) in current {
        let previous_reference = previous.get(module_name);
        if previous_reference == Some(current_reference) {
            states.insert(
                module_name.clone(),
                ReleaseModuleState::new(ReleaseStatus::Unchanged, Vec::new()),
            );
            continue;
        }

        let module_state = sync_dir
            .read_module_state(module_name)
            .with_context(|| format!("retrieve module state of {module_name}"))?;
        let references = module_state.references();

        let state = match previous_reference {
            None => ReleaseModuleState::new(ReleaseStatus::New, references.to_vec()),
            Some(previous_reference) => {
                match references
                    .iter()
                    .position(|reference| reference.name() == previous_reference)
                {
                    Some(index) if index + 1 == references.len() => anyhow::bail!(
                        "module {} indicated as having updates, but previous release {} is the latest",
                        module_name,
                        previous_reference
                    ),
                    Some(index) => ReleaseModuleState::new(
                        ReleaseStatus::Updated,
                        references[index + 1..].to_vec(),
                    ),
                    None => {
                        warn!(
                            module = module_name,
                            reference = previous_reference,
                            "previously released reference not in module history"
                        );
                        ReleaseModuleState::new(ReleaseStatus::Updated, references.to_vec())
                    }
                }
            }
        };
        debug!(module = module_name, status = ?state.status(), "release status");
        states.insert(module_name.clone(), state);
    }

    for module_name in previous.keys() {
        if !current.contains_key(module_name) {
            states.insert(
                module_name.clone(),
                ReleaseModuleState::new(ReleaseStatus::Removed, Vec::new()),
            );
        }
    }

    Ok(states)
}

/// Whether anything other than unchanged modules would be released
pub fn should_release(states: &BTreeMap<String, ReleaseModuleState>) -> bool {
    states
        .values()
        .any(|state| state.status() != ReleaseStatus::Unchanged)
}
