//! Versioned object store for zbot
//!
//! Records are persisted as immutable JSON files, one per save:
//!
//! ```text
//! <workdir>/store/<type>/<instance id>/<YYYY-MM-DD>/<HH:MM:SS.ffffff>
//! ```
//!
//! - [`Store`]: save, load and rebuild records
//! - [`Find`]: lazy query results (`find`, `all`, `deleted`, `history`)
//! - [`edit`]: apply `key=value` assignments to a record

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edit;
pub mod query;
pub mod store;

pub use edit::edit;
pub use query::{Find, Visibility};
pub use store::{Store, STORE_DIR};
