use crate::common::redirect_temp_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use rstest::fixture;
use std::path::Path;

pub const OWNER: &str = "acme";
pub const REPO: &str = "widgets";

#[fixture]
pub fn sync_root() -> TempDir {
    redirect_temp_dir();
    TempDir::new().expect("Failed to create temp dir")
}

/// A sync root holding `acme/widgets` at references v1, v2 and v3
///
/// v2 changes `a.proto` and adds `c.proto`; v3 renames `c.proto` to `d.proto`.
#[fixture]
pub fn synced_module(sync_root: TempDir) -> TempDir {
    let versions: [(&str, &[(&str, &str)]); 3] = [
        ("v1", &[("a.proto", "message A {}\n"), ("b.proto", "message B {}\n")]),
        (
            "v2",
            &[
                ("a.proto", "message A {\n  string name = 1;\n}\n"),
                ("b.proto", "message B {}\n"),
                ("c.proto", "message C {}\n"),
            ],
        ),
        (
            "v3",
            &[
                ("a.proto", "message A {\n  string name = 1;\n}\n"),
                ("b.proto", "message B {}\n"),
                ("d.proto", "message C {}\n"),
            ],
        ),
    ];

    for (reference, files) in versions {
        let src = sync_root.child(format!("src/{reference}"));
        for (path, content) in files {
            src.child(path)
                .write_str(content)
                .expect("Failed to write source file");
        }
        mod_process(sync_root.path(), &format!("src/{reference}"), reference)
            .assert()
            .success();
    }

    sync_root
}

pub fn run_modsync_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("modsync").expect("Failed to find modsync binary");
    cmd.envs(vec![("RUST_LOG", "off")]);
    cmd.env_remove("GITHUB_TOKEN");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn mod_process(dir: &Path, src_dir: &str, reference: &str) -> Command {
    run_modsync_command(
        dir,
        &[
            "mod-process",
            "--root-sync-dir",
            "sync",
            "--src-dir",
            src_dir,
            "--owner",
            OWNER,
            "--repo",
            REPO,
            "--ref",
            reference,
        ],
    )
}

pub fn module_dir(sync_root: &Path) -> std::path::PathBuf {
    sync_root.join("sync").join(OWNER).join(REPO)
}
