//! Timers launched through the kernel's task table.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use zbot::{Repeater, Timer};

use crate::common::*;

#[test]
fn test_timer_payload_runs_on_its_own_task() {
    let tk = TestKernel::new();
    let names = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let n = Arc::clone(&names);
    let timer = Timer::new(tk.kernel.tasks(), "alarm", Duration::from_millis(10), move || {
        n.lock().push(thread::current().name().map(str::to_string));
    });
    timer.start().join();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(names.lock().clone(), vec![Some("alarm".to_string())]);
}

#[test]
fn test_stopped_timer_never_fires() {
    let tk = TestKernel::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let timer = Timer::new(tk.kernel.tasks(), "never", Duration::from_millis(50), move || {
        c.fetch_add(1, Ordering::SeqCst);
    });
    let task = timer.start();
    timer.stop();
    task.join();
    thread::sleep(Duration::from_millis(80));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_tsk_shows_pending_repeater() {
    let tk = TestKernel::new();
    tk.kernel.init(&["basic"]);
    let repeater = Repeater::new(tk.kernel.tasks(), "heartbeat", Duration::from_secs(300), || {});
    repeater.start();

    let lines = tk.kernel.cmd("tsk").result();
    assert!(lines.iter().any(|line| line.ends_with("heartbeat")));
    repeater.stop();
}

#[test]
fn test_slow_payload_does_not_delay_ticks() {
    let tk = TestKernel::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let repeater = Repeater::new(tk.kernel.tasks(), "slow", Duration::from_millis(10), move || {
        c.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
    });
    repeater.start();
    thread::sleep(Duration::from_millis(80));
    repeater.stop();
    assert!(count.load(Ordering::SeqCst) >= 3);
}
