//! Version listings are ordered by the time encoded in each path.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use zbot::{stamp_time, Record, TimeWindow};

use crate::common::*;

#[test]
fn test_list_versions_in_time_order_across_instances() {
    let ts = TestStore::new();
    let mut a = ts.note("a1");
    ts.note("b1");
    a.set("txt", "a2");
    ts.store.save(&mut a).unwrap();
    ts.note("c1");

    let paths = ts.store.list_versions(NOTE, None).unwrap();
    assert_eq!(paths.len(), 4);
    let times: Vec<f64> = paths.iter().map(|p| stamp_time(p)).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(
        texts(ts.store.history(NOTE, None, None).unwrap()),
        vec!["a1", "b1", "a2", "c1"]
    );
}

#[test]
fn test_backdated_saves_sort_before_current() {
    let ts = TestStore::new();
    ts.note("today");
    let at = NaiveDate::from_ymd_opt(2019, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let mut old = Record::new(NOTE).with("txt", "imported");
    ts.store.save_at(&mut old, Some(at)).unwrap();

    assert_eq!(texts(ts.store.all(NOTE).unwrap()), vec!["imported", "today"]);
    assert_eq!(ts.store.latest(NOTE).unwrap().unwrap().get_str("txt"), "today");
}

#[test]
fn test_backdated_same_second_stays_distinct() {
    let ts = TestStore::new();
    let at = NaiveDate::from_ymd_opt(2020, 2, 2)
        .unwrap()
        .and_hms_opt(2, 2, 2)
        .unwrap();
    let mut record = Record::new(NOTE);
    let mut paths = HashSet::new();
    for _ in 0..20 {
        paths.insert(ts.store.save_at(&mut record, Some(at)).unwrap());
    }
    assert_eq!(paths.len(), 20);
    assert_eq!(ts.store.list_versions(NOTE, None).unwrap().len(), 20);
}

#[test]
fn test_window_excludes_old_versions() {
    let ts = TestStore::new();
    let at = NaiveDate::from_ymd_opt(2018, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut old = Record::new(NOTE).with("txt", "ancient");
    ts.store.save_at(&mut old, Some(at)).unwrap();
    ts.note("recent");

    let last_day = TimeWindow::parse("1d-0s").unwrap();
    assert_eq!(
        texts(ts.store.find(NOTE, None, None, Some(&last_day)).unwrap()),
        vec!["recent"]
    );
}

proptest! {
    #[test]
    fn stamp_time_orders_like_the_clock(
        a in 0u32..86_400, b in 0u32..86_400,
        ua in 0u32..1_000_000, ub in 0u32..1_000_000
    ) {
        let day = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        let at = |secs: u32, micros: u32| {
            day.and_hms_micro_opt(secs / 3600, (secs / 60) % 60, secs % 60, micros).unwrap()
        };
        let (ta, tb) = (at(a, ua), at(b, ub));
        let pa = format!("x.X/id/{}", ta.format("%Y-%m-%d/%H:%M:%S%.6f"));
        let pb = format!("x.X/id/{}", tb.format("%Y-%m-%d/%H:%M:%S%.6f"));
        if ta < tb {
            prop_assert!(stamp_time(&pa) <= stamp_time(&pb));
        }
    }
}
