// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use rstest::{fixture, rstest};
use url::Url;

use super::{
    sanitize_file_name, write_atomic, FolderAssets, FolderStore, StoreError, StoredRecord,
    WriteDurability,
};
use crate::assets::{AssetError, AssetStorage};
use crate::model::fixtures::sample_blueprint;
use crate::model::{AssetNamespace, RecordId};
use crate::persist::{PersistError, PersistenceService, SaveMeta};
use crate::resolve::BusinessContext;

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("blueprint-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

#[fixture]
fn tmp() -> TempDir {
    TempDir::new("store")
}

fn meta() -> SaveMeta {
    let context = BusinessContext {
        name: "Rosie's Bakery".to_owned(),
        niche: "bakery".to_owned(),
        locale: "en-GB".to_owned(),
    };
    SaveMeta::new(&context, Utc::now())
}

fn assets(root: &Path) -> FolderAssets {
    FolderAssets::new(
        root,
        Url::parse("http://127.0.0.1:27436/assets").unwrap(),
        AssetNamespace::default(),
    )
}

fn temp_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".blueprint.tmp."))
        .collect()
}

#[rstest]
#[case::best_effort(WriteDurability::BestEffort)]
#[case::durable(WriteDurability::Durable)]
fn write_atomic_replaces_contents_without_leftovers(tmp: TempDir, #[case] durability: WriteDurability) {
    let path = tmp.path().join("nested").join("file.json");
    write_atomic(&path, b"first", durability).unwrap();
    write_atomic(&path, b"second", durability).unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"second");
    assert!(temp_files(path.parent().unwrap()).is_empty());
}

#[cfg(unix)]
#[rstest]
fn write_atomic_refuses_symlinks(tmp: TempDir) {
    let target = tmp.path().join("target.json");
    fs::write(&target, b"x").unwrap();
    let link = tmp.path().join("link.json");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let err = write_atomic(&link, b"y", WriteDurability::BestEffort).unwrap_err();
    assert!(matches!(err, StoreError::SymlinkRefused { .. }));
    assert_eq!(fs::read(&target).unwrap(), b"x");
}

#[rstest]
#[tokio::test]
async fn create_then_update_targets_one_record(tmp: TempDir) {
    let store = FolderStore::new(tmp.path());
    let mut document = sample_blueprint();

    let id = store.create(&document, &meta()).await.unwrap();
    assert_eq!(store.list().unwrap(), vec![id.clone()]);

    document.set_name("Rosie's Bakehouse");
    let updated = store.update(&id, &document, &meta()).await.unwrap();
    assert_eq!(updated, id);
    assert_eq!(store.list().unwrap().len(), 1);

    let record = store.load(&id).unwrap();
    assert_eq!(record.document, document);
    assert_eq!(record.meta.business_name, "Rosie's Bakery");
}

#[rstest]
fn list_skips_foreign_files_and_handles_a_missing_dir(tmp: TempDir) {
    let store = FolderStore::new(tmp.path());
    assert!(store.list().unwrap().is_empty());

    let record = StoredRecord {
        id: RecordId::new("rec-b").unwrap(),
        meta: meta(),
        document: sample_blueprint(),
    };
    store.write(&record).unwrap();
    store.write(&StoredRecord { id: RecordId::new("rec-a").unwrap(), ..record }).unwrap();
    fs::write(store.records_dir().join("notes.txt"), b"hello").unwrap();

    let ids = store.list().unwrap();
    assert_eq!(ids, vec![RecordId::new("rec-a").unwrap(), RecordId::new("rec-b").unwrap()]);
}

#[rstest]
fn loading_a_corrupt_record_is_a_json_error(tmp: TempDir) {
    let store = FolderStore::new(tmp.path());
    let id = RecordId::new("broken").unwrap();
    fs::create_dir_all(store.records_dir()).unwrap();
    fs::write(store.record_path(&id).unwrap(), b"{ not json").unwrap();

    assert!(matches!(store.load(&id), Err(StoreError::Json { .. })));
    assert!(matches!(
        store.load(&RecordId::new("missing").unwrap()),
        Err(StoreError::Io { .. })
    ));
}

#[rstest]
#[case("..")]
#[case(".hidden")]
#[case("a\\b")]
fn unsafe_record_ids_are_rejected(tmp: TempDir, #[case] raw: &str) {
    let store = FolderStore::new(tmp.path());
    let id = RecordId::new(raw).unwrap();
    assert!(matches!(store.record_path(&id), Err(StoreError::UnsafeSegment { .. })));
}

#[test]
fn permission_denied_maps_to_unauthorized() {
    let denied = StoreError::Io {
        path: PathBuf::from("/records/x.json"),
        source: io::Error::from(io::ErrorKind::PermissionDenied),
    };
    assert!(PersistError::from(denied).is_unauthorized());

    let full = StoreError::Io {
        path: PathBuf::from("/records/x.json"),
        source: io::Error::other("disk full"),
    };
    assert!(matches!(PersistError::from(full), PersistError::Failed { .. }));
}

#[rstest]
#[tokio::test]
async fn uploads_land_under_the_namespace_and_delete_is_idempotent(tmp: TempDir) {
    let storage = assets(tmp.path());
    let id = sample_blueprint().id().clone();

    let url = storage.upload(&id, "Hero Shot.png", b"png").await.unwrap();
    assert_eq!(url, "http://127.0.0.1:27436/assets/blueprint-assets/bp-1/Hero-Shot.png");
    assert!(AssetNamespace::default().owns(&id, &url));

    let path = tmp.path().join("blueprint-assets").join("bp-1").join("Hero-Shot.png");
    assert_eq!(fs::read(&path).unwrap(), b"png");

    storage.delete(&url).await.unwrap();
    assert!(!path.exists());
    storage.delete(&url).await.unwrap();
}

#[rstest]
#[tokio::test]
async fn foreign_urls_are_not_deleted(tmp: TempDir) {
    let storage = assets(tmp.path());
    for url in [
        "https://images.example.org/blueprint-assets/bp-1/a.png",
        "http://127.0.0.1:27436/assetsX/blueprint-assets/bp-1/a.png",
        "http://127.0.0.1:27436/assets/other/bp-1/a.png",
        "http://127.0.0.1:27436/assets/blueprint-assets/bp-1/../../x",
    ] {
        assert!(
            matches!(storage.delete(url).await, Err(AssetError::Foreign { .. })),
            "{url}"
        );
    }
}

#[rstest]
#[tokio::test]
async fn invalid_upload_names_are_rejected(tmp: TempDir) {
    let storage = assets(tmp.path());
    let id = sample_blueprint().id().clone();
    assert!(matches!(
        storage.upload(&id, "../escape.png", b"x").await,
        Err(AssetError::InvalidFileName { .. })
    ));
}

#[test]
fn sanitized_names_are_url_safe() {
    assert_eq!(sanitize_file_name("menu (v2).pdf"), "menu--v2-.pdf");
    assert_eq!(sanitize_file_name("café.jpg"), "caf-.jpg");
    assert_eq!(sanitize_file_name("plain_name-1.webp"), "plain_name-1.webp");
}

#[test]
fn resolve_relative_requires_three_segments() {
    let storage = assets(Path::new("/srv/site"));
    assert_eq!(
        storage.resolve_relative("blueprint-assets/bp-1/a.png"),
        Some(PathBuf::from("/srv/site/blueprint-assets/bp-1/a.png"))
    );
    assert_eq!(storage.resolve_relative("blueprint-assets/bp-1"), None);
    assert_eq!(storage.resolve_relative("blueprint-assets/bp-1/../a.png"), None);
}
