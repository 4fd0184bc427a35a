//! Event kernel for zbot
//!
//! Accepts lines of command text, dispatches each to a registered handler on
//! its own task, and routes replies back to where the line came from.
//!
//! - [`Event`]: one command line, its replies and its completion signal
//! - [`Kernel`]: queue, handler loop, dispatch, module loading
//! - [`Module`] / [`ModuleCatalog`]: command bundles and their registry
//! - [`Tasks`]: the task-launch primitive shared by dispatch and timers
//! - [`Timer`] / [`Repeater`]: delayed and periodic work
//! - [`Bus`]: reply outputs keyed by origin
//! - [`Config`]: `zbot.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod config;
pub mod event;
pub mod kernel;
pub mod module;
pub mod modules;
pub mod registry;
pub mod task;
pub mod timer;

pub use bus::{Buffer, Bus, Output};
pub use config::{Config, CONFIG_FILE_NAME, DEFAULT_PACKAGE};
pub use event::Event;
pub use kernel::{Kernel, WeakKernel};
pub use module::{InitFn, Module, ModuleCatalog, ModuleFactory};
pub use registry::{CommandFn, CommandRegistry};
pub use task::{Task, TaskInfo, Tasks};
pub use timer::{Repeater, Timer};
