//! Tombstoned records leave normal queries but stay on disk.

use zbot::{edit, Setter};

use crate::common::*;

#[test]
fn test_tombstone_excluded_from_find_and_all() {
    let ts = TestStore::new();
    let mut gone = ts.note("gone");
    ts.note("kept");
    gone.mark_deleted();
    ts.store.save(&mut gone).unwrap();

    assert_eq!(texts(ts.store.all(NOTE).unwrap()), vec!["kept"]);
    assert_eq!(texts(ts.store.deleted(NOTE).unwrap()), vec!["gone"]);
    assert_eq!(ts.store.list_versions(NOTE, None).unwrap().len(), 3);
    for path in ts.store.list_versions(NOTE, None).unwrap() {
        assert!(ts.store.version_file(&path).unwrap().is_file());
    }
}

#[test]
fn test_tombstone_via_edit() {
    let ts = TestStore::new();
    let mut record = ts.note("edit me");
    let mut setter = Setter::new();
    setter.insert("_deleted".to_string(), "True".to_string());
    assert_eq!(edit(&mut record, &setter, false), 1);
    ts.store.save(&mut record).unwrap();

    assert_eq!(ts.store.all(NOTE).unwrap().count(), 0);
    assert_eq!(ts.store.deleted(NOTE).unwrap().count(), 1);
}

#[test]
fn test_undelete_restores_instance() {
    let ts = TestStore::new();
    let mut record = ts.note("back again");
    record.mark_deleted();
    ts.store.save(&mut record).unwrap();
    assert_eq!(ts.store.all(NOTE).unwrap().count(), 0);

    record.set("_deleted", false);
    ts.store.save(&mut record).unwrap();
    assert_eq!(texts(ts.store.all(NOTE).unwrap()), vec!["back again"]);
}

#[test]
fn test_history_keeps_tombstones() {
    let ts = TestStore::new();
    let mut record = ts.note("tracked");
    record.mark_deleted();
    ts.store.save(&mut record).unwrap();

    let history: Vec<bool> = ts
        .store
        .history(NOTE, None, None)
        .unwrap()
        .map(|r| r.unwrap().is_deleted())
        .collect();
    assert_eq!(history, vec![false, true]);
}
