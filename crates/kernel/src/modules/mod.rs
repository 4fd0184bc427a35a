//! Shipped modules
//!
//! Registered in every kernel's catalog under the `zbot` package:
//! - `zbot.basic`: kernel introspection (`cmd`, `mds`, `tsk`, `upt`, `ver`)
//! - `zbot.log`: a `log.Log` record type and generic record commands
//!   (`log`, `fnd`, `dlt`, `edt`)

pub mod basic;
pub mod log;

use crate::module::ModuleCatalog;

/// Add the shipped modules to `catalog`.
pub fn register(catalog: &ModuleCatalog) {
    catalog.register(basic::NAME, basic::module);
    catalog.register(log::NAME, log::module);
}
