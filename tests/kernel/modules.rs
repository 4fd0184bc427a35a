//! Module init, walk and the shipped modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use zbot::kernel::modules::log::LOG_TYPE;
use zbot::{Kernel, Module, Repeater};

use crate::common::*;

#[test]
fn test_init_skips_unknown_and_runs_initializers() {
    let tk = TestKernel::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&runs);
    tk.kernel.catalog().register("test.starter", move |_k: &Kernel| {
        let r = Arc::clone(&r);
        Module::new("test.starter").with_init(move |_k: &Kernel| {
            std::thread::sleep(Duration::from_millis(20));
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });

    let loaded = tk.kernel.init(&["basic", "nonexistent", "starter"]);
    assert_eq!(loaded.len(), 2);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(tk.kernel.commands().contains(&"cmd".to_string()));
}

#[test]
fn test_init_can_start_a_repeater() {
    let tk = TestKernel::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let holder = Arc::new(parking_lot::Mutex::new(None));
    let (t, h) = (Arc::clone(&ticks), Arc::clone(&holder));
    tk.kernel.catalog().register("test.clock", move |_k: &Kernel| {
        let (t, h) = (Arc::clone(&t), Arc::clone(&h));
        Module::new("test.clock").with_init(move |kernel: &Kernel| {
            let t = Arc::clone(&t);
            let repeater = Repeater::new(kernel.tasks(), "clock", Duration::from_millis(10), move || {
                t.fetch_add(1, Ordering::SeqCst);
            });
            repeater.start();
            *h.lock() = Some(repeater);
            Ok(())
        })
    });

    tk.kernel.init(&["clock"]);
    std::thread::sleep(Duration::from_millis(100));
    let repeater = holder.lock().take().unwrap();
    repeater.stop();
    assert!(ticks.load(Ordering::SeqCst) >= 2);
    assert!(repeater.timer().fired() >= 2);
}

#[test]
fn test_log_module_end_to_end() {
    let tk = TestKernel::new();
    tk.kernel.init(&["log"]);
    assert_eq!(tk.kernel.cmd("log first entry").result(), vec!["ok"]);
    assert_eq!(tk.kernel.cmd("log second entry").result(), vec!["ok"]);

    let found = tk.kernel.cmd("fnd log txt==second").result();
    assert_eq!(found.len(), 1);
    assert!(found[0].contains("txt=second entry"));

    assert_eq!(tk.kernel.cmd("dlt log txt==first").result(), vec!["deleted 1"]);
    assert_eq!(tk.kernel.store().all(LOG_TYPE).unwrap().count(), 1);
    assert_eq!(tk.kernel.store().list_versions(LOG_TYPE, None).unwrap().len(), 3);
}

#[test]
fn test_walk_registers_everything_shipped() {
    let tk = TestKernel::new();
    let modules = tk.kernel.walk(&["zbot"]);
    let names: Vec<&str> = modules.iter().map(Module::name).collect();
    assert_eq!(names, vec!["zbot.basic", "zbot.log"]);
    assert_eq!(
        tk.kernel.commands(),
        vec!["cmd", "dlt", "edt", "fnd", "log", "mds", "tsk", "upt", "ver"]
    );
}
