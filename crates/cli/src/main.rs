//! zbot: command daemon with a versioned object store.
//!
//! Three modes:
//! - **Single-shot**: `zbot [flags] WORDS...` runs one command and exits
//! - **Console**: `zbot [flags]` reads commands from stdin, one per line
//! - **Daemon**: `zbot -d` runs the kernel with no console until stopped

mod commands;
mod console;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zbot_core::{error_line, Result, TypeRegistry};
use zbot_kernel::{Config, Kernel, CONFIG_FILE_NAME};
use zbot_store::Store;

use commands::{build_cli, split_mods};

fn main() {
    let matches = build_cli().get_matches();

    let filter = if matches.get_flag("verbose") {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let workdir = matches
        .get_one::<String>("wd")
        .map(PathBuf::from)
        .unwrap_or_else(default_workdir);
    let mods = matches.get_one::<String>("mods").map(|list| split_mods(list));

    let kernel = match open_kernel(workdir, mods) {
        Ok(kernel) => kernel,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            process::exit(1);
        }
    };

    if let Some(words) = matches.get_many::<String>("words") {
        let txt = words.cloned().collect::<Vec<_>>().join(" ");
        let mods = kernel.config().mods.clone();
        kernel.init(&mods);
        for line in kernel.cmd(txt).result() {
            println!("{}", line);
        }
        return;
    }

    let handler = match kernel.start() {
        Ok(handler) => handler,
        Err(e) => {
            error!("{}", error_line(&e));
            process::exit(1);
        }
    };
    info!(workdir = %kernel.store().workdir().unwrap_or_default().display(), "zbot running");

    if matches.get_flag("daemon") {
        kernel.wait();
    } else {
        console::run(&kernel, std::io::stdin().lock());
        kernel.stop();
    }
    handler.join();
}

/// Open the store, read (or create) `zbot.toml` and build the kernel.
fn open_kernel(workdir: PathBuf, mods: Option<Vec<String>>) -> Result<Kernel> {
    let store = Store::open(&workdir, TypeRegistry::new())?;
    let config_path = workdir.join(CONFIG_FILE_NAME);
    Config::write_default_if_missing(&config_path)?;
    let mut config = Config::from_file(&config_path)?;
    if let Some(mods) = mods {
        config.mods = mods;
    }
    Ok(Kernel::new(config, Arc::new(store)))
}

fn default_workdir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".zbot"),
        None => PathBuf::from(".zbot"),
    }
}
