//! Selector filtering, index selection and query parsing.

use proptest::prelude::*;
use zbot::{ParsedArgs, Record, Selector};

use crate::common::*;

fn select(pairs: &[(&str, &str)]) -> Selector {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_find_returns_exact_substring_matches() {
    let ts = TestStore::new();
    for name in ["subway", "submarine", "bus", "tube"] {
        let mut record = Record::new(NOTE).with("name", name);
        ts.store.save(&mut record).unwrap();
    }
    let found: Vec<String> = ts
        .store
        .find(NOTE, Some(&select(&[("name", "sub")])), None, None)
        .unwrap()
        .map(|r| r.unwrap().get_str("name"))
        .collect();
    assert_eq!(found, vec!["subway", "submarine"]);
}

#[test]
fn test_all_pairs_must_match() {
    let ts = TestStore::new();
    for (txt, prio) in [("alpha", "1"), ("alpha", "2"), ("beta", "1")] {
        let mut record = Record::new(NOTE).with("txt", txt).with("prio", prio);
        ts.store.save(&mut record).unwrap();
    }
    let sel = select(&[("txt", "alpha"), ("prio", "2")]);
    assert_eq!(ts.store.find(NOTE, Some(&sel), None, None).unwrap().count(), 1);
}

#[test]
fn test_index_picks_nth_match() {
    let ts = TestStore::new();
    for txt in ["x0", "y", "x1", "x2"] {
        ts.note(txt);
    }
    let sel = select(&[("txt", "x")]);
    assert_eq!(
        texts(ts.store.find(NOTE, Some(&sel), Some(2), None).unwrap()),
        vec!["x2"]
    );
    assert_eq!(
        texts(ts.store.find(NOTE, None, Some(1), None).unwrap()),
        vec!["y"]
    );
}

#[test]
fn test_find_query_from_command_words() {
    let ts = TestStore::new();
    ts.note("milk");
    ts.note("bread");
    ts.note("more milk");
    let parsed = ParsedArgs::parse(&["note", "txt==milk", "1"]);
    let query = parsed.query(NOTE);
    assert_eq!(texts(ts.store.find_query(&query).unwrap()), vec!["more milk"]);
}

#[test]
fn test_missing_field_never_matches_nonempty_value() {
    let ts = TestStore::new();
    ts.note("no name field");
    let sel = select(&[("name", "a")]);
    assert_eq!(ts.store.find(NOTE, Some(&sel), None, None).unwrap().count(), 0);
}

proptest! {
    #[test]
    fn search_matches_iff_substring(field in "[a-z]{0,12}", needle in "[a-z]{1,3}") {
        let record = Record::new(NOTE).with("txt", field.as_str());
        let sel = select(&[("txt", needle.as_str())]);
        prop_assert_eq!(record.search(&sel), field.contains(needle.as_str()));
    }
}
