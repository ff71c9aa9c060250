//! File-backed result persistence.

use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::GameResult;
use unlock_shell::error::StoreError;
use unlock_shell::result_store::ResultStore;

#[test]
fn results_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");

    let mut store = ResultStore::open(&path).unwrap();
    assert!(store.is_empty());
    let result = GameResult::new(GameTypeId::Pour, "Split the G").with_meta("grade", "Perfect");
    store.save("inv-1", result.clone()).unwrap();

    let reopened = ResultStore::open(&path).unwrap();
    assert_eq!(reopened.get("inv-1"), Some(&result));

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("catch_result_inv-1"));
}

#[test]
fn remove_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    let mut store = ResultStore::open(&path).unwrap();
    store
        .save("inv", GameResult::new(GameTypeId::Memory, "All matched"))
        .unwrap();
    assert!(store.remove("inv").unwrap().is_some());
    assert!(store.remove("inv").unwrap().is_none());
    assert!(ResultStore::open(&path).unwrap().is_empty());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ResultStore::open(&path).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn empty_file_is_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    std::fs::write(&path, "").unwrap();
    assert!(ResultStore::open(&path).unwrap().is_empty());
}
