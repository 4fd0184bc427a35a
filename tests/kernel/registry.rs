//! Command registry updates through module loading.

use std::sync::{Arc, Barrier};
use std::thread;

use zbot::{Event, Kernel, Module};

use crate::common::*;

fn replying(name: &'static str, reply: &'static str) -> Module {
    Module::new(name).with_command("hello", move |event: &Event| {
        event.reply(reply);
        Ok(())
    })
}

#[test]
fn test_second_module_wins() {
    let tk = TestKernel::new();
    let catalog = tk.kernel.catalog();
    catalog.register("test.first", |_k: &Kernel| replying("test.first", "from first"));
    catalog.register("test.second", |_k: &Kernel| replying("test.second", "from second"));

    tk.kernel.load_module("test.first").unwrap();
    assert_eq!(tk.kernel.cmd("hello").result(), vec!["from first"]);
    tk.kernel.load_module("test.second").unwrap();
    assert_eq!(tk.kernel.cmd("hello").result(), vec!["from second"]);
}

#[test]
fn test_loading_while_dispatching() {
    let tk = TestKernel::new();
    let catalog = tk.kernel.catalog();
    for i in 0..20 {
        let name = format!("test.m{}", i);
        let command = format!("c{}", i);
        catalog.register(name.clone(), move |_k: &Kernel| {
            Module::new(name.clone()).with_command(command.clone(), |event: &Event| {
                event.reply("ok");
                Ok(())
            })
        });
    }
    tk.kernel.load_module("test.m0").unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let loader = {
        let kernel = tk.kernel.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for i in 1..20 {
                kernel.load_module(&format!("test.m{}", i)).unwrap();
            }
        })
    };
    barrier.wait();
    for _ in 0..200 {
        assert_eq!(tk.kernel.cmd("c0").result(), vec!["ok"]);
    }
    loader.join().unwrap();
    assert_eq!(tk.kernel.commands().len(), 20);
}
