use crate::common::command::{OWNER, REPO, mod_process, module_dir, run_modsync_command, sync_root};
use assert_fs::TempDir;
use assert_fs::prelude::*;
use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use predicates::prelude::*;
use rstest::rstest;

mod common;

#[rstest]
fn mod_process_writes_blobs_and_state_files(
    sync_root: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_name = format!("{}.proto", Word().fake::<String>());
    let file_content = Words(5..10).fake::<Vec<String>>().join(" ");
    sync_root
        .child("src")
        .child(&file_name)
        .write_str(&file_content)?;

    mod_process(sync_root.path(), "src", "v1.0.0")
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r#"^(blob written "sync/acme/widgets/cas/[0-9a-f]{128}"\n){2}$"#,
        )?);

    let module_state = std::fs::read_to_string(module_dir(sync_root.path()).join("state.json"))?;
    assert!(module_state.contains(r#""name": "v1.0.0""#));
    let global_state = std::fs::read_to_string(sync_root.path().join("sync/state.json"))?;
    assert!(global_state.contains(&format!(r#""module_name": "{OWNER}/{REPO}""#)));
    assert!(global_state.contains(r#""latest_reference": "v1.0.0""#));

    Ok(())
}

#[rstest]
fn mod_process_skips_existing_blobs(sync_root: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    sync_root.child("src/a.proto").write_str("message A {}\n")?;
    sync_root.child("src/b/c.proto").write_str("message C {}\n")?;

    mod_process(sync_root.path(), "src", "v1")
        .assert()
        .success();
    mod_process(sync_root.path(), "src", "v1-again")
        .assert()
        .success()
        .stdout(predicate::str::contains("blob written").not())
        .stdout(predicate::str::is_match(
            r#"^(skipping existing blob "sync/acme/widgets/cas/[0-9a-f]{128}"\n){3}$"#,
        )?);

    run_modsync_command(&module_dir(sync_root.path()), &["casdiff", "v1", "v1-again"])
        .assert()
        .success()
        .stdout("0 files changed: 0 removed, 0 renamed, 0 added, 0 changed content\n");

    Ok(())
}

#[rstest]
fn mod_process_with_a_repeated_reference_fails(
    sync_root: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    sync_root.child("src/a.proto").write_str("message A {}\n")?;

    mod_process(sync_root.path(), "src", "v1")
        .assert()
        .success();
    mod_process(sync_root.path(), "src", "v1")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("reference v1 has appeared multiple times"));

    Ok(())
}

#[rstest]
fn mod_process_reports_every_missing_flag(
    sync_root: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_modsync_command(sync_root.path(), &["mod-process", "--owner", "acme", "--repo", ""])
        .assert()
        .failure()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains(
            "missing required flag(s): --root-sync-dir, --src-dir, --repo, --ref",
        ));

    Ok(())
}
