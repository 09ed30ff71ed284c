use crate::areas::sync_dir::SYNC_ROOT;
use crate::artifacts::state::STATE_FILE_NAME;
use std::collections::HashSet;

/// Module directories whose `state.json` shows up in `git diff --name-only` output
///
/// Directories are deduplicated and keep the order in which git listed them. The global
/// state file at the sync root is not a module.
pub fn changed_module_paths(name_only_output: &str) -> Vec<String> {
    let prefix = format!("{SYNC_ROOT}/");
    let suffix = format!("/{STATE_FILE_NAME}");

    let mut seen = HashSet::new();
    name_only_output
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.strip_prefix(&prefix)
                .is_some_and(|module_file| module_file.ends_with(&suffix))
        })
        .filter_map(|line| line.strip_suffix(&suffix).map(str::to_string))
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

/// Path of the state file of a module directory
pub fn module_state_file(module_path: &str) -> String {
    format!("{module_path}/{STATE_FILE_NAME}")
}
