//! Save then load reproduces every field; only the stamp's time moves.

use std::fs;

use zbot::{Record, Stamp, Value};

use crate::common::*;

#[test]
fn test_round_trip_all_value_kinds() {
    let ts = TestStore::new();
    let tag = Record::new("note.Tag").with("name", "home");
    let mut record = Record::new(NOTE)
        .with("txt", "hello")
        .with("count", 42i64)
        .with("ratio", 0.25)
        .with("done", true)
        .with("nothing", Value::Null)
        .with(
            "items",
            Value::List(vec![Value::from("a"), Value::from(2i64)]),
        )
        .with("tag", tag);
    let placeholder = record.stamp().clone();
    let path = ts.store.save(&mut record).unwrap();

    let mut loaded = Record::new(NOTE);
    ts.store.load(&mut loaded, &path).unwrap();
    for key in ["txt", "count", "ratio", "done", "nothing", "items"] {
        assert_eq!(loaded.get(key), record.get(key), "field {}", key);
    }
    let nested = loaded.get("tag").and_then(Value::as_record).unwrap();
    assert_eq!(nested.get_str("name"), "home");

    let stamp = Stamp::parse(&path).unwrap();
    assert_eq!(stamp.type_name(), placeholder.type_name());
    assert_eq!(stamp.instance_id(), placeholder.instance_id());
    assert_eq!(loaded.stamp(), &stamp);
}

#[test]
fn test_hook_rebuilds_from_path_alone() {
    let ts = TestStore::new();
    let record = ts.note("from the path");
    let rebuilt = ts.store.hook(&record.stamp().path()).unwrap();
    assert_eq!(rebuilt.type_name(), NOTE);
    assert_eq!(rebuilt.get_str("txt"), "from the path");
}

#[test]
fn test_wire_format_embeds_stamp() {
    let ts = TestStore::new();
    let record = ts.note("wire");
    let path = record.stamp().path();
    let file = ts.store.version_file(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(json["stamp"], serde_json::Value::String(path));
    assert_eq!(json["txt"], serde_json::Value::String("wire".into()));
}

#[test]
fn test_versions_are_never_rewritten() {
    let ts = TestStore::new();
    let mut record = ts.note("v1");
    let first = record.stamp().path();
    let first_file = ts.store.version_file(&first).unwrap();
    let before = fs::read_to_string(&first_file).unwrap();

    record.set("txt", "v2");
    let second = ts.store.save(&mut record).unwrap();
    assert_ne!(first, second);
    assert_eq!(fs::read_to_string(&first_file).unwrap(), before);
    assert!(fs::metadata(&first_file).unwrap().permissions().readonly());
}

#[test]
fn test_last_loads_newest_version() {
    let ts = TestStore::new();
    ts.note("older");
    ts.note("newer");
    let mut target = Record::new(NOTE);
    assert!(ts.store.last(&mut target).unwrap());
    assert_eq!(target.get_str("txt"), "newer");

    let mut empty = Record::new("note.Tag");
    assert!(!ts.store.last(&mut empty).unwrap());
}
