use crate::artifacts::release::{ReleaseModuleState, ReleaseStatus};
use crate::artifacts::state::module_state::ModuleReference;
use std::collections::BTreeMap;

/// Maximum number of reference rows in a module table
const MAX_ROWS: usize = 5;
/// Rows kept at each end of a truncated table
const EDGE_ROWS: usize = 2;

fn write_row(out: &mut String, reference: &ModuleReference) {
    out.push_str(&format!(
        "| `{}` | `{}` |\n",
        reference.name(),
        reference.digest()
    ));
}

pub fn write_references_table(out: &mut String, module_name: &str, references: &[ModuleReference]) {
    let count = references.len();
    out.push_str(&format!(
        "\n<details><summary>{module_name}: {count} update(s)</summary>\n\n| Reference | Manifest Digest |\n|---|---|\n"
    ));

    if count <= MAX_ROWS {
        references.iter().for_each(|reference| write_row(out, reference));
    } else {
        let skipped = count - 2 * EDGE_ROWS;
        references[..EDGE_ROWS]
            .iter()
            .for_each(|reference| write_row(out, reference));
        out.push_str(&format!(
            "| ... {skipped} references skipped ... | ... {skipped} references skipped ... |\n"
        ));
        references[count - EDGE_ROWS..]
            .iter()
            .for_each(|reference| write_row(out, reference));
    }

    out.push_str("\n</details>\n");
}

fn write_module_list<'m>(out: &mut String, header: &str, modules: impl Iterator<Item = &'m str>) {
    out.push_str(&format!(
        "## {header}\n\n<details><summary>Expand</summary>\n\n"
    ));
    for module in modules {
        out.push_str(&format!("- {module}\n"));
    }
    out.push_str("\n</details>\n");
}

/// Markdown body of release `name`, modules in name order
pub fn release_body(name: &str, states: &BTreeMap<String, ReleaseModuleState>) -> String {
    let mut out = format!("# Buf Modules Release {name}\n\n");

    let with_status = |status: ReleaseStatus| {
        states
            .iter()
            .filter(move |(_, state)| state.status() == status)
    };

    for (status, header) in [
        (ReleaseStatus::New, "New Modules"),
        (ReleaseStatus::Updated, "Updated Modules"),
    ] {
        let mut tables = String::new();
        for (module_name, state) in with_status(status) {
            write_references_table(&mut tables, module_name, state.references());
        }
        if !tables.is_empty() {
            out.push_str(&format!("## {header}\n{tables}\n"));
        }
    }

    let mut lists = Vec::new();
    for (status, header) in [
        (ReleaseStatus::Unchanged, "Unchanged Modules"),
        (ReleaseStatus::Removed, "Removed Modules"),
    ] {
        if with_status(status).next().is_some() {
            let mut list = String::new();
            write_module_list(
                &mut list,
                header,
                with_status(status).map(|(module_name, _)| module_name.as_str()),
            );
            lists.push(list);
        }
    }
    out.push_str(&lists.join("\n"));

    out
}
