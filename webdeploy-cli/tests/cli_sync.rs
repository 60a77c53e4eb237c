use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use assert_cmd::prelude::*;
use filetime::{set_file_mtime, FileTime};
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

/// `webdeploy` with config discovery pinned inside `work`.
fn webdeploy_cmd(work: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("webdeploy"));
    cmd.current_dir(work)
        .env("HOME", work)
        .env("XDG_CONFIG_HOME", work.join("xdg"))
        .env_remove("WEBDEPLOY_CONFIG")
        .env_remove("WEBDEPLOY_CONTAINER")
        .env_remove("WEBDEPLOY_PURGE_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn site(work: &TempDir) -> PathBuf {
    let source = work.path().join("site");
    let past = SystemTime::now() - Duration::from_secs(60 * 60);
    for (name, body) in [
        ("index.html", "<h1>home</h1>"),
        ("css/site.css", "body{}"),
        (".DS_Store", "junk"),
    ] {
        let path = source.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        set_file_mtime(&path, FileTime::from_system_time(past)).unwrap();
    }
    source
}

#[test]
fn dry_run_reports_and_writes_nothing() {
    let work = TempDir::new().unwrap();
    let source = site(&work);
    let container = work.path().join("web");
    fs::create_dir_all(&container).unwrap();

    webdeploy_cmd(work.path())
        .arg("sync")
        .arg(&source)
        .arg("--container")
        .arg(&container)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("index.html"))
        .stdout(contains("css/site.css"))
        .stdout(contains(".DS_Store").not());

    assert!(
        fs::read_dir(&container).unwrap().next().is_none(),
        "dry-run must not create files"
    );
}

#[test]
fn sync_copies_site_and_second_run_is_noop() {
    let work = TempDir::new().unwrap();
    let source = site(&work);
    let container = work.path().join("web");

    webdeploy_cmd(work.path())
        .args(["sync", "site", "--create", "--container", "web"])
        .assert()
        .success()
        .stdout(contains("2 uploaded"));

    assert_eq!(
        fs::read_to_string(container.join("css/site.css")).unwrap(),
        "body{}"
    );
    assert!(!container.join(".DS_Store").exists());

    webdeploy_cmd(work.path())
        .arg("sync")
        .arg(&source)
        .arg("--container")
        .arg(&container)
        .assert()
        .success()
        .stdout(contains("nothing to do"));
}

#[test]
fn sync_removes_stale_blobs() {
    let work = TempDir::new().unwrap();
    let source = site(&work);
    let container = work.path().join("web");
    fs::create_dir_all(container.join("old")).unwrap();
    fs::write(container.join("old/page.html"), "gone").unwrap();

    webdeploy_cmd(work.path())
        .arg("sync")
        .arg(&source)
        .arg("--container")
        .arg(&container)
        .assert()
        .success()
        .stdout(contains("1 deleted"));

    assert!(!container.join("old").exists());
}

#[test]
fn plan_json_lists_buckets() {
    let work = TempDir::new().unwrap();
    site(&work);
    let container = work.path().join("web");
    fs::create_dir_all(&container).unwrap();
    fs::write(container.join("stale.txt"), "x").unwrap();

    let output = webdeploy_cmd(work.path())
        .args(["plan", "site", "--container", "web", "--json"])
        .output()
        .expect("run webdeploy plan");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["new"], 2);
    assert_eq!(json["summary"]["deleted"], 1);
    assert_eq!(json["new"], serde_json::json!(["css/site.css", "index.html"]));
    assert_eq!(json["deleted"], serde_json::json!(["stale.txt"]));
}

#[test]
fn init_writes_config_used_by_plan() {
    let work = TempDir::new().unwrap();
    site(&work);
    fs::create_dir_all(work.path().join("web")).unwrap();

    webdeploy_cmd(work.path())
        .args(["init", "--container", "web"])
        .assert()
        .success()
        .stdout(contains("webdeploy.yaml"));
    assert!(work.path().join("webdeploy.yaml").is_file());

    webdeploy_cmd(work.path())
        .args(["init", "--container", "web"])
        .assert()
        .failure()
        .stderr(contains("already exists"));

    webdeploy_cmd(work.path())
        .args(["plan", "site"])
        .assert()
        .success()
        .stdout(contains("2 new"));
}

#[test]
fn sync_without_container_fails() {
    let work = TempDir::new().unwrap();
    site(&work);

    webdeploy_cmd(work.path())
        .args(["sync", "site"])
        .assert()
        .failure()
        .stderr(contains("container"));
}

#[test]
fn purge_without_endpoint_fails() {
    let work = TempDir::new().unwrap();

    webdeploy_cmd(work.path())
        .arg("purge")
        .assert()
        .failure()
        .stderr(contains("no purge endpoint configured"));
}
