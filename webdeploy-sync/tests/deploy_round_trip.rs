//! End-to-end deploys against a directory-backed container.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;

use webdeploy_core::{BlobName, DeployConfig};
use webdeploy_sync::properties;
use webdeploy_sync::{deploy, list_all, DeployAction, Deployment, DirectoryStore, UploadReason};

fn write_at(root: &Path, name: &str, content: &str, mtime: SystemTime) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    set_file_mtime(&path, FileTime::from_system_time(mtime)).unwrap();
}

fn names(store: &DirectoryStore) -> Vec<String> {
    list_all(store).unwrap().into_keys().map(|n| n.0).collect()
}

fn config_for(container: &Path) -> DeployConfig {
    DeployConfig {
        container: Some(container.to_path_buf()),
        ..DeployConfig::default()
    }
}

#[test]
fn classifies_new_updated_tie_and_deleted() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let container = tmp.path().join("web");
    let past = SystemTime::now() - Duration::from_secs(2 * 60 * 60);
    let later = SystemTime::now() + Duration::from_secs(60 * 60);

    // Container starts with three blobs, all stamped `past`.
    for name in ["edited.html", "same.html", "stale/old.png"] {
        write_at(&container, name, "remote", past);
    }
    write_at(&source, "edited.html", "local edit", later);
    write_at(&source, "same.html", "local", past);
    write_at(&source, "fresh.css", "body{}", past);

    let mut store = DirectoryStore::open(&container, 2).unwrap();
    let report = deploy(&source, &mut store, None, &DeployConfig::default(), false).unwrap();

    assert!(report.actions.contains(&DeployAction::Uploaded {
        name: BlobName::from("fresh.css"),
        reason: UploadReason::New,
    }));
    assert!(report.actions.contains(&DeployAction::Uploaded {
        name: BlobName::from("edited.html"),
        reason: UploadReason::Updated,
    }));
    assert!(report.actions.contains(&DeployAction::Unchanged {
        name: BlobName::from("same.html"),
    }));
    assert!(report.actions.contains(&DeployAction::Deleted {
        name: BlobName::from("stale/old.png"),
    }));

    assert_eq!(names(&store), vec!["edited.html", "fresh.css", "same.html"]);
    assert_eq!(
        fs::read_to_string(container.join("edited.html")).unwrap(),
        "local edit"
    );
    // Equal timestamps keep the remote copy.
    assert_eq!(fs::read_to_string(container.join("same.html")).unwrap(), "remote");
    assert!(!container.join("stale").exists(), "empty dir pruned");

    let record = store.record(&BlobName::from("fresh.css")).expect("record");
    assert_eq!(
        record.properties.cache_control.as_deref(),
        Some("public,max-age=31536000")
    );
}

#[test]
fn second_deploy_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let past = SystemTime::now() - Duration::from_secs(60 * 60);
    write_at(&source, "index.html", "<p>", past);
    write_at(&source, "assets/logo.svg", "<svg/>", past);

    let mut deployment = Deployment::init(config_for(&tmp.path().join("web")), true).unwrap();
    let first = deployment.run(&source, false).unwrap();
    assert_eq!(first.upload_count(), 2);

    let second = deployment.run(&source, false).unwrap();
    assert_eq!(second.upload_count(), 0);
    assert_eq!(second.delete_count(), 0);
    assert_eq!(second.unchanged_count(), 2);
}

#[test]
fn dry_run_leaves_container_untouched() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let container = tmp.path().join("web");
    write_at(&source, "index.html", "new", SystemTime::now());
    write_at(&container, "gone.html", "old", SystemTime::now());

    let mut deployment = Deployment::init(config_for(&container), false).unwrap();
    let report = deployment.run(&source, true).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.upload_count(), 1);
    assert_eq!(report.delete_count(), 1);
    assert!(container.join("gone.html").exists());
    assert!(!container.join("index.html").exists());
    assert!(!properties::index_path_at(&container).exists());
}

#[test]
fn hidden_files_skipped_unless_included() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let container = tmp.path().join("web");
    let past = SystemTime::now() - Duration::from_secs(60);
    write_at(&source, "index.html", "x", past);
    write_at(&source, ".env", "SECRET=1", past);
    write_at(&source, ".well-known/security.txt", "contact", past);

    let mut deployment = Deployment::init(config_for(&container), true).unwrap();
    deployment.run(&source, false).unwrap();
    assert_eq!(names(deployment.store()), vec!["index.html"]);

    let mut config = config_for(&container);
    config.include_hidden = true;
    let mut deployment = Deployment::init(config, false).unwrap();
    deployment.run(&source, false).unwrap();
    assert_eq!(
        names(deployment.store()),
        vec![".env", ".well-known/security.txt", "index.html"]
    );
}

#[test]
fn listing_pages_cover_large_container() {
    let tmp = TempDir::new().unwrap();
    let container = tmp.path().join("web");
    for i in 0..25 {
        write_at(&container, &format!("f{i:02}.txt"), "x", SystemTime::now());
    }
    let store = DirectoryStore::open(&container, 7).unwrap();
    assert_eq!(list_all(&store).unwrap().len(), 25);
}

#[test]
fn file_blob_replaced_by_directory_converges() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let container = tmp.path().join("web");
    let past = SystemTime::now() - Duration::from_secs(60 * 60);
    write_at(&container, "docs", "old page", past);
    write_at(&source, "docs/index.html", "new page", past);

    let mut deployment = Deployment::init(config_for(&container), false).unwrap();
    let report = deployment.run(&source, false).unwrap();

    assert_eq!(report.upload_count(), 1);
    assert_eq!(report.delete_count(), 1);
    assert_eq!(names(deployment.store()), vec!["docs/index.html"]);
    assert!(deployment.plan(&source).unwrap().is_noop());
}

#[test]
fn directory_replaced_by_file_blob_converges() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let container = tmp.path().join("web");
    let past = SystemTime::now() - Duration::from_secs(60 * 60);
    write_at(&container, "docs/index.html", "old", past);
    write_at(&container, "docs/img/a.png", "old", past);
    write_at(&source, "docs", "flattened", past);

    let mut deployment = Deployment::init(config_for(&container), false).unwrap();
    let report = deployment.run(&source, false).unwrap();

    assert_eq!(report.upload_count(), 1);
    assert_eq!(report.delete_count(), 2);
    assert_eq!(names(deployment.store()), vec!["docs"]);
    assert_eq!(fs::read_to_string(container.join("docs")).unwrap(), "flattened");
    assert!(deployment.plan(&source).unwrap().is_noop());
}

#[test]
fn index_prefixed_hidden_file_is_uploaded_once() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("site");
    let container = tmp.path().join("web");
    let past = SystemTime::now() - Duration::from_secs(60);
    write_at(&source, ".webdeploy-properties.json.bak", "{}", past);

    let mut config = config_for(&container);
    config.include_hidden = true;
    let mut deployment = Deployment::init(config, true).unwrap();

    assert_eq!(deployment.run(&source, false).unwrap().upload_count(), 1);
    assert_eq!(deployment.run(&source, false).unwrap().upload_count(), 0);
    assert!(properties::index_path_at(&container).is_file());
}
