//! End-to-end persistence tests against the on-disk SQLite store.
//!
//! Each test gets its own temp directory, so nothing touches the user's real
//! data directory.

use std::sync::Arc;

use sitconnect_core::model::{CURRENT_STUDENT_ID, Child};
use sitconnect_core::{
    ApplicantIndex, ImportError, Notice, PartialBlob, PersistedBlob, Role, SqliteStore,
    StorageError, StorageService,
};

fn notice(id: &str, applicant_count: u32) -> Notice {
    Notice {
        id: id.to_string(),
        date: "2025-11-15".into(),
        time: "18:00".into(),
        pay_per_hour: "25".into(),
        area: "Downtown".into(),
        notes: "Pizza dinner included!".into(),
        children: vec![
            Child {
                age: "5".into(),
                gender: "girl".into(),
                interests: "Art, Reading".into(),
            },
            Child {
                age: "8".into(),
                gender: "boy".into(),
                interests: "Sports".into(),
            },
        ],
        applicant_count,
    }
}

fn open(dir: &tempfile::TempDir) -> StorageService {
    let store = SqliteStore::open(&dir.path().join("sitconnect.db")).expect("open store");
    StorageService::new(Arc::new(store))
}

fn populated() -> PartialBlob {
    let mut applications = ApplicantIndex::new();
    applications.insert("1".into(), vec!["1".into(), "2".into(), CURRENT_STUDENT_ID.into()]);
    let mut selected = ApplicantIndex::new();
    selected.insert("1".into(), vec!["2".into()]);

    PartialBlob {
        notices: Some(vec![notice("1", 3)]),
        applications: Some(applications),
        selected_applicants: Some(selected),
        applied_notices: Some(vec!["1".into()]),
        user_role: Some(Some(Role::Student)),
        ..PartialBlob::default()
    }
}

#[test]
fn export_then_import_round_trips() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = open(&source_dir);
    source.save(populated()).unwrap();
    let exported = source.load();
    let path = source.export_to_dir(source_dir.path()).unwrap();
    assert!(
        path.file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("sitconnect_backup_")
    );

    let target_dir = tempfile::tempdir().unwrap();
    let target = open(&target_dir);
    let adopted = target.import_file(&path).unwrap();

    assert_eq!(adopted, PartialBlob::from(exported.clone()));
    assert_eq!(target.load().data, exported.data);
}

#[test]
fn import_without_data_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir);
    service.save(populated()).unwrap();
    let before = service.load();

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"version": "1.0", "exportDate": "2025-11-20T00:00:00Z"}"#).unwrap();

    let err = service.import_file(&bad).unwrap_err();
    assert!(matches!(err, StorageError::Import(ImportError::MissingData)));
    assert_eq!(service.load(), before);
}

#[test]
fn import_of_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir);
    let err = service
        .import_file(&dir.path().join("nope.json"))
        .unwrap_err();
    assert!(matches!(err, StorageError::Io(_)));
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    open(&dir).save(populated()).unwrap();

    let reopened = open(&dir);
    let blob = reopened.load();
    assert_eq!(blob.data.notices[0].applicant_count, 3);
    assert_eq!(blob.data.user_role, Some(Role::Student));
    assert_eq!(reopened.stats().applicant_count, 3);
}

#[test]
fn clear_restores_default_blob() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir);
    service.save(populated()).unwrap();

    service.clear();

    assert_eq!(service.load(), PersistedBlob::default());
    assert_eq!(service.stats().storage_bytes, 0);
}

#[test]
fn export_to_missing_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir);
    let err = service
        .export_to_dir(&dir.path().join("missing").join("deeper"))
        .unwrap_err();
    assert!(matches!(err, StorageError::Export(_)));
}
