//! Queue, dispatch and reply delivery.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use zbot::kernel::Buffer;
use zbot::{Error, Event};

use crate::common::*;

#[test]
fn test_dispatch_completion_sees_parsed_args() {
    let tk = TestKernel::new();
    let seen = Arc::new(Mutex::new(None));
    let finished = Arc::new(AtomicBool::new(false));
    let (s, f) = (Arc::clone(&seen), Arc::clone(&finished));
    tk.kernel.register("cmd", move |event: &Event| {
        *s.lock() = Some((event.cmd(), event.args()));
        thread::sleep(Duration::from_millis(30));
        f.store(true, Ordering::SeqCst);
        Ok(())
    });
    let handler = tk.kernel.start().unwrap();

    let event = tk.kernel.submit_text("nobody", "cmd arg1 arg2");
    event.wait();
    assert!(finished.load(Ordering::SeqCst));
    let (cmd, args) = seen.lock().clone().unwrap();
    assert_eq!(cmd, "cmd");
    assert_eq!(args, vec!["arg1", "arg2"]);

    tk.kernel.stop();
    assert!(handler.join());
}

#[test]
fn test_unknown_command_completes_empty() {
    let tk = TestKernel::new();
    let handler = tk.kernel.start().unwrap();
    let event = tk.kernel.submit_text("nobody", "nosuchcommand a b");
    assert!(event.wait_timeout(Duration::from_secs(5)));
    assert!(event.result().is_empty());
    tk.kernel.stop();
    handler.join();
}

#[test]
fn test_failing_handler_delivers_partial_replies() {
    let tk = TestKernel::new();
    let out = Arc::new(Buffer::new("buf"));
    tk.kernel.bus().add(out.clone());
    tk.kernel.register("fail", |event: &Event| {
        event.reply("step 1");
        Err(Error::command("step 2 failed"))
    });
    tk.kernel.register("panic", |event: &Event| {
        event.reply("about to panic");
        panic!("handler bug");
    });
    let handler = tk.kernel.start().unwrap();

    tk.kernel.submit_text("buf", "fail").wait();
    tk.kernel.submit_text("buf", "panic").wait();
    assert_eq!(out.lines(), vec!["step 1", "about to panic"]);

    // The queue keeps working after failures.
    tk.kernel.register("ok", |event: &Event| {
        event.reply("fine");
        Ok(())
    });
    tk.kernel.submit_text("buf", "ok").wait();
    assert_eq!(out.lines().last().map(String::as_str), Some("fine"));

    tk.kernel.stop();
    handler.join();
}

#[test]
fn test_events_run_in_parallel() {
    let tk = TestKernel::new();
    let barrier = Arc::new(Barrier::new(3));
    let b = Arc::clone(&barrier);
    // Each handler blocks until all three run at once; serial dispatch would hang.
    tk.kernel.register("meet", move |event: &Event| {
        b.wait();
        event.reply("met");
        Ok(())
    });
    let handler = tk.kernel.start().unwrap();

    let events: Vec<Event> = (0..3)
        .map(|_| tk.kernel.submit_text("nobody", "meet"))
        .collect();
    for event in &events {
        assert!(event.wait_timeout(Duration::from_secs(5)));
        assert_eq!(event.result(), vec!["met"]);
    }
    tk.kernel.stop();
    handler.join();
}

#[test]
fn test_redispatch_after_text_change() {
    let tk = TestKernel::new();
    tk.kernel.register("a", |event: &Event| {
        event.reply("A");
        Ok(())
    });
    tk.kernel.register("b", |event: &Event| {
        event.reply(event.rest());
        Ok(())
    });
    let event = tk.kernel.cmd("a");
    event.set_txt("b x y");
    tk.kernel.dispatch(&event);
    assert_eq!(event.result(), vec!["A", "x y"]);
}

#[test]
fn test_wait_joins_event_sub_tasks() {
    let tk = TestKernel::new();
    let done = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&done);
    let tasks = tk.kernel.tasks().clone();
    tk.kernel.register("bg", move |event: &Event| {
        for _ in 0..3 {
            let d = Arc::clone(&d);
            event.spawn(&tasks, "bg-work", move || {
                thread::sleep(Duration::from_millis(20));
                d.fetch_add(1, Ordering::SeqCst);
            });
        }
        Ok(())
    });
    let handler = tk.kernel.start().unwrap();

    let event = tk.kernel.submit_text("nobody", "bg");
    assert_eq!(event.wait(), vec![true, true, true]);
    assert_eq!(done.load(Ordering::SeqCst), 3);
    tk.kernel.stop();
    handler.join();
}

#[test]
fn test_stop_ends_handler_loop() {
    let tk = TestKernel::new();
    let handler = tk.kernel.start().unwrap();
    assert!(!tk.kernel.is_stopped());
    tk.kernel.stop();
    tk.kernel.wait();
    assert!(handler.join());
}

#[test]
fn test_nul_in_command_does_not_stall_queue() {
    let tk = TestKernel::new();
    tk.kernel.register("ok", |event: &Event| {
        event.reply("fine");
        Ok(())
    });
    let handler = tk.kernel.start().unwrap();

    let bad = tk.kernel.submit_text("nobody", "a\0b");
    let good = tk.kernel.submit_text("nobody", "ok");
    assert!(bad.wait_timeout(Duration::from_secs(5)));
    assert!(good.wait_timeout(Duration::from_secs(5)));
    assert!(bad.result().is_empty());
    assert_eq!(good.result(), vec!["fine"]);

    tk.kernel.stop();
    assert!(handler.join());
}
