//! Concurrent saves produce complete, distinct files.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use zbot::Record;

use crate::common::*;

#[test]
fn test_concurrent_saves_distinct_records() {
    let ts = TestStore::new();
    let threads = 8;
    let per_thread = 10;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&ts.store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .map(|i| {
                        let mut record = Record::new(NOTE)
                            .with("txt", format!("t{}-{}", t, i))
                            .with("payload", "x".repeat(4096));
                        store.save(&mut record).unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut paths = HashSet::new();
    for handle in handles {
        paths.extend(handle.join().unwrap());
    }
    assert_eq!(paths.len(), threads * per_thread);

    for path in &paths {
        let record = ts.store.hook(path).unwrap();
        assert_eq!(record.get_str("payload").len(), 4096);
        assert!(record.get_str("txt").starts_with('t'));
    }
    assert_eq!(
        ts.store.list_versions(NOTE, None).unwrap().len(),
        threads * per_thread
    );
}

#[test]
fn test_concurrent_saves_same_instance() {
    let ts = TestStore::new();
    let base = ts.note("shared");
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&ts.store);
            let barrier = Arc::clone(&barrier);
            let mut record = base.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..5 {
                    record.set("txt", format!("{}-{}", t, i));
                    store.save(&mut record).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ts.store.list_versions(NOTE, None).unwrap().len(), 21);
    assert_eq!(ts.store.latest_versions(NOTE, None).unwrap().len(), 1);
}

#[test]
fn test_reads_see_writes_immediately() {
    let ts = TestStore::new();
    for i in 0..5 {
        ts.note(&format!("n{}", i));
        assert_eq!(ts.store.all(NOTE).unwrap().count(), i + 1);
    }
}
