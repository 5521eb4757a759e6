//! Integration tests for the modmove binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn demo_crate(c_rs: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/a")).unwrap();

    fs::write(
        root.join("Cargo.toml"),
        "[package]\nname = \"demo\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    )
    .unwrap();
    fs::write(root.join("src/lib.rs"), "pub mod a;\npub mod c;\nmod user;\n").unwrap();
    fs::write(root.join("src/a.rs"), "pub mod b;\n").unwrap();
    fs::write(root.join("src/a/b.rs"), "pub fn f() {}\n").unwrap();
    fs::write(root.join("src/c.rs"), c_rs).unwrap();
    fs::write(root.join("src/user.rs"), "fn g() { crate::a::b::f(); }\n").unwrap();
    temp_dir
}

fn modmove(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("modmove").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn test_tree_lists_modules() {
    let temp_dir = demo_crate("");

    modmove(temp_dir.path())
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 crate"))
        .stdout(predicate::str::contains("a [pub]"))
        .stdout(predicate::str::contains("b [pub]"))
        .stdout(predicate::str::contains("user [private]"));
}

#[test]
fn test_check_prints_json_report() {
    let temp_dir = demo_crate("mod hidden {}\n");

    modmove(temp_dir.path())
        .args(["check", "src/a/b.rs", "--to", "crate::c::hidden", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"must_publicize\": true"))
        .stdout(predicate::str::contains(
            "module `crate::c::hidden` is not accessible from `crate::user`",
        ));
}

#[test]
fn test_move_rewrites_files_on_disk() {
    let temp_dir = demo_crate("");
    let root = temp_dir.path();

    modmove(root)
        .args(["move", "src/a/b.rs", "--to", "crate::c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ Moved to"));

    assert!(!root.join("src/a/b.rs").exists());
    assert_eq!(fs::read_to_string(root.join("src/c/b.rs")).unwrap(), "pub fn f() {}\n");
    assert_eq!(fs::read_to_string(root.join("src/a.rs")).unwrap(), "");
    assert!(fs::read_to_string(root.join("src/c.rs")).unwrap().contains("pub mod b;"));
    assert_eq!(
        fs::read_to_string(root.join("src/user.rs")).unwrap(),
        "fn g() { crate::c::b::f(); }\n"
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = demo_crate("");
    let root = temp_dir.path();

    modmove(root)
        .args(["mv", "src/a/b.rs", "--to", "crate::c", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📦"))
        .stdout(predicate::str::contains("crate::c::b"));

    assert!(root.join("src/a/b.rs").exists());
    assert!(!root.join("src/c").exists());
    assert_eq!(fs::read_to_string(root.join("src/a.rs")).unwrap(), "pub mod b;\n");
}

#[test]
fn test_conflicts_decline_without_yes() {
    let temp_dir = demo_crate("mod hidden {}\n");
    let root = temp_dir.path();

    modmove(root)
        .args(["move", "src/a/b.rs", "--to", "crate::c::hidden"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pass --yes"));

    assert!(root.join("src/a/b.rs").exists());
}

#[test]
fn test_unknown_target_fails() {
    let temp_dir = demo_crate("");

    modmove(temp_dir.path())
        .args(["check", "src/a/b.rs", "--to", "crate::nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("crate::nope"));
}
