//! Log entries and generic record commands
//!
//! - `log <text>` saves a `log.Log` entry; `log` alone lists the live entries
//! - `fnd <type> [key==value] [fields] [N] [window]` lists matching records;
//!   `fnd` alone lists the types present in the store
//! - `dlt <type> key==value` tombstones the matching records
//! - `edt <type> key==value key=value` edits and re-saves the matching records

use std::sync::Arc;

use zbot_core::{elapsed, time, Error, ParsedArgs, Record, Result};
use zbot_store::{edit, Store};

use crate::event::Event;
use crate::kernel::Kernel;
use crate::module::Module;

/// Qualified module name
pub const NAME: &str = "zbot.log";

/// Record type of log entries
pub const LOG_TYPE: &str = "log.Log";

/// Build the module for `kernel`, registering `log.Log` with its store.
pub fn module(kernel: &Kernel) -> Module {
    let store = Arc::clone(kernel.store());
    store
        .types()
        .register(LOG_TYPE, || Record::new(LOG_TYPE).with("txt", ""));
    let (log_s, fnd_s, dlt_s, edt_s) = (
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        store,
    );
    Module::new(NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_command("log", move |event: &Event| log(&log_s, event))
        .with_command("fnd", move |event: &Event| fnd(&fnd_s, event))
        .with_command("dlt", move |event: &Event| dlt(&dlt_s, event))
        .with_command("edt", move |event: &Event| edt(&edt_s, event))
}

fn log(store: &Store, event: &Event) -> Result<()> {
    let rest = event.rest();
    if rest.is_empty() {
        let now = time::now_secs();
        for (nr, entry) in store.all(LOG_TYPE)?.enumerate() {
            let entry = entry?;
            event.reply(format!(
                "{} {} {}",
                nr,
                entry.get_str("txt"),
                elapsed(now - entry.stamp().timestamp(), true)
            ));
        }
        return Ok(());
    }
    let mut entry = Record::new(LOG_TYPE).with("txt", rest);
    store.save(&mut entry)?;
    event.reply("ok");
    Ok(())
}

/// Resolve the first plain argument to a stored type name.
fn target_type(store: &Store, parsed: &ParsedArgs) -> Result<String> {
    let name = parsed
        .args
        .first()
        .ok_or_else(|| Error::command("no type given"))?;
    store
        .types()
        .resolve(name)
        .ok_or_else(|| Error::NoSuchType(name.clone()))
}

fn fnd(store: &Store, event: &Event) -> Result<()> {
    let parsed = event.parsed();
    if parsed.args.is_empty() {
        let types = store.stored_types()?;
        if !types.is_empty() {
            event.reply(types.join(","));
        }
        return Ok(());
    }
    let type_name = match target_type(store, &parsed) {
        Ok(type_name) => type_name,
        Err(Error::NoSuchType(name)) => {
            event.reply(format!("no {} type", name));
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let fields: Vec<&str> = parsed.args[1..].iter().map(String::as_str).collect();
    let keys = (!fields.is_empty()).then_some(fields.as_slice());
    let skip = parsed.skipped();
    let now = time::now_secs();
    let mut found = 0;
    for (nr, record) in store.find_query(&parsed.query(&type_name))?.enumerate() {
        let record = record?;
        event.reply(format!(
            "{} {} {}",
            nr,
            record.format(keys, false, &skip),
            elapsed(now - record.stamp().timestamp(), true)
        ));
        found += 1;
    }
    if found == 0 {
        event.reply("no result");
    }
    Ok(())
}

fn dlt(store: &Store, event: &Event) -> Result<()> {
    let parsed = event.parsed();
    if parsed.args.is_empty() || parsed.gets.is_empty() {
        event.reply("dlt <type> key==value");
        return Ok(());
    }
    let type_name = target_type(store, &parsed)?;
    let matches: Vec<Record> = store
        .find_query(&parsed.query(&type_name))?
        .collect::<Result<_>>()?;
    for mut record in matches.iter().cloned() {
        record.mark_deleted();
        store.save(&mut record)?;
    }
    event.reply(format!("deleted {}", matches.len()));
    Ok(())
}

fn edt(store: &Store, event: &Event) -> Result<()> {
    let parsed = event.parsed();
    if parsed.args.is_empty() || parsed.gets.is_empty() || parsed.sets.is_empty() {
        event.reply("edt <type> key==value key=value");
        return Ok(());
    }
    let type_name = target_type(store, &parsed)?;
    let matches: Vec<Record> = store
        .find_query(&parsed.query(&type_name))?
        .collect::<Result<_>>()?;
    let mut changed = 0;
    for mut record in matches {
        if edit(&mut record, &parsed.sets, true) > 0 {
            store.save(&mut record)?;
            changed += 1;
        }
    }
    event.reply(format!("edited {}", changed));
    Ok(())
}
