//! Kernel introspection commands

use std::time::Instant;

use zbot_core::elapsed;

use crate::event::Event;
use crate::kernel::Kernel;
use crate::module::Module;

/// Qualified module name
pub const NAME: &str = "zbot.basic";

/// Build the module for `kernel`.
pub fn module(kernel: &Kernel) -> Module {
    let weak = kernel.downgrade();
    let (cmd_k, mds_k, tsk_k, upt_k, ver_k) = (
        weak.clone(),
        weak.clone(),
        weak.clone(),
        weak.clone(),
        weak,
    );
    Module::new(NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_command("cmd", move |event: &Event| {
            event.reply(cmd_k.get()?.commands().join(","));
            Ok(())
        })
        .with_command("mds", move |event: &Event| {
            let kernel = mds_k.get()?;
            let names: Vec<String> = kernel
                .catalog()
                .names()
                .iter()
                .map(|name| name.rsplit('.').next().unwrap_or(name).to_string())
                .collect();
            event.reply(names.join(","));
            Ok(())
        })
        .with_command("tsk", move |event: &Event| {
            let kernel = tsk_k.get()?;
            let now = Instant::now();
            let mut tasks: Vec<(f64, String)> = kernel
                .tasks()
                .list()
                .into_iter()
                .map(|info| (info.remaining_or_age(now), info.name))
                .collect();
            tasks.sort_by(|a, b| a.0.total_cmp(&b.0));
            for (nr, (secs, name)) in tasks.iter().enumerate() {
                let name: String = name.chars().take(60).collect();
                let line = format!("{} {:<8} {:<50}", nr, elapsed(*secs, true), name);
                event.reply(line.trim_end());
            }
            Ok(())
        })
        .with_command("upt", move |event: &Event| {
            let kernel = upt_k.get()?;
            event.reply(elapsed(kernel.uptime().as_secs_f64(), false));
            Ok(())
        })
        .with_command("ver", move |event: &Event| {
            let kernel = ver_k.get()?;
            for module in kernel.walk(&kernel.packages()) {
                if !module.version().is_empty() {
                    event.reply(format!("{} {}", module.name(), module.version()));
                }
            }
            Ok(())
        })
}
