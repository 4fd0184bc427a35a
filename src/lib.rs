//! zbot - command daemon with a versioned, append-only object store
//!
//! Two subsystems make up the daemon:
//!
//! - the **object store** ([`Store`]): every save of a [`Record`] writes a new,
//!   immutable JSON file; queries scan the version tree
//! - the **event kernel** ([`Kernel`]): lines of command text become
//!   [`Event`]s, dispatched concurrently to handlers provided by [`Module`]s
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use zbot::{Config, Kernel, Store, TypeRegistry};
//!
//! let store = Store::open("/tmp/zbot", TypeRegistry::new())?;
//! let kernel = Kernel::new(Config::default(), Arc::new(store));
//! kernel.init(&["basic", "log"]);
//!
//! kernel.cmd("log buy milk");
//! for line in kernel.cmd("fnd log txt==milk").result() {
//!     println!("{}", line);
//! }
//! ```

pub use zbot_kernel as kernel;
pub use zbot_store as store;

pub use zbot_core::{
    elapsed, error_line, stamp_time, Error, ParsedArgs, Query, Record, Result, Selector, Setter,
    Stamp, TimeWindow, TypeRegistry, Value,
};
pub use zbot_kernel::{
    Bus, Config, Event, Kernel, Module, ModuleCatalog, Output, Repeater, Task, Tasks, Timer,
};
pub use zbot_store::{edit, Find, Store};
