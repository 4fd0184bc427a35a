//! Core types for zbot
//!
//! This crate defines the record model shared by the store and the kernel:
//! - Value: field value variants
//! - Record: open-schema record with its version stamp
//! - Stamp: `(type, instance id, date, time)` identity of one stored version
//! - TypeRegistry: explicit type-name to factory table
//! - Selector tokens: Selector, Setter, TimeWindow, ParsedArgs, Query
//! - Time helpers: stamp time decoding, elapsed-time rendering
//! - Error: Error type and Result alias

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod args;
pub mod error;
pub mod record;
pub mod stamp;
pub mod time;
pub mod types;
pub mod value;

pub use args::{ParsedArgs, Query, Selector, Setter, TimeWindow};
pub use error::{error_line, Error, Result};
pub use record::{Record, DELETED_KEY, STAMP_KEY};
pub use stamp::Stamp;
pub use time::{elapsed, stamp_time};
pub use types::{Factory, TypeRegistry};
pub use value::Value;
