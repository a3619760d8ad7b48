use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use skylift_core::ChecksumManifest;

fn skylift() -> Command {
    Command::cargo_bin("skylift").expect("skylift binary")
}

fn make_bundle(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("app")).unwrap();
    std::fs::write(dir.join("index.html"), b"<html/>").unwrap();
    std::fs::write(dir.join("app/main.js"), b"main()").unwrap();
}

#[test]
fn pack_writes_a_parsable_manifest() {
    let bundle = TempDir::new().unwrap();
    make_bundle(bundle.path());

    skylift()
        .arg("pack")
        .arg(bundle.path())
        .args(["--id", "v0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("packed v0 (2 files)"));

    let json = std::fs::read_to_string(bundle.path().join("manifest.json")).unwrap();
    let manifest = ChecksumManifest::parse(&json).expect("engine-consumable manifest");
    assert_eq!(manifest.id.as_str(), "v0");
    assert_eq!(manifest.files.len(), 2);
}

#[test]
fn status_reports_missing_state() {
    let root = TempDir::new().unwrap();
    skylift()
        .arg("status")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No active release"));
}

#[test]
fn sync_bootstraps_from_a_packed_baseline_without_a_remote() {
    let bundle = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    make_bundle(bundle.path());

    skylift()
        .arg("pack")
        .arg(bundle.path())
        .args(["--id", "v0"])
        .assert()
        .success();

    // First run installs the baseline and never contacts the remote, so an
    // unroutable URL is fine.
    skylift()
        .args(["sync", "--remote", "http://127.0.0.1:9/app"])
        .arg("--baseline")
        .arg(bundle.path())
        .arg("--root")
        .arg(root.path())
        .args(["--interval", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bootstrapped baseline release v0"));

    skylift()
        .arg("status")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("v0").and(predicate::str::contains("files: 2")));

    // Second run passes the gate, fails the remote fetch, and degrades to a
    // no-op that keeps the bootstrapped release.
    skylift()
        .args(["sync", "--remote", "http://127.0.0.1:9/app"])
        .arg("--baseline")
        .arg(bundle.path())
        .arg("--root")
        .arg(root.path())
        .args(["--interval", "0", "--connect-timeout", "1", "--read-timeout", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sync failed; keeping release v0"));
}
