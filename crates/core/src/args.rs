//! Selector tokens
//!
//! Command arguments carry small pieces of query syntax that the store consumes:
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `key==value` | filter: the field must contain `value` |
//! | `key=value` | set `key` on the record acted on |
//! | `key-` | leave `key` out |
//! | `3` | take the 3rd (0-based) match |
//! | `2d`, `3d-1d` | time window, measured back from now |
//! | `-o`, `--opt` | flag |
//!
//! Everything else stays a plain argument.

use std::collections::{BTreeMap, BTreeSet};

use crate::time::{now_secs, parse_duration};

/// Field filters: field name to required substring.
pub type Selector = BTreeMap<String, String>;

/// Field assignments: field name to literal value.
pub type Setter = BTreeMap<String, String>;

/// Inclusive `from`/`to` range in epoch seconds; an open end is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    /// Lower bound
    pub from: Option<f64>,
    /// Upper bound
    pub to: Option<f64>,
}

impl TimeWindow {
    /// Window between two epoch times.
    pub fn between(from: f64, to: f64) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Everything at or after `from`.
    pub fn since(from: f64) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Everything at or before `to`.
    pub fn until(to: f64) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Parse a `3d-1d` range or a single `2h` ("older than 2h") token.
    pub fn parse(token: &str) -> Option<Self> {
        let now = now_secs();
        if let Some((older, newer)) = token.split_once('-') {
            let from = parse_duration(older)?;
            let to = parse_duration(newer)?;
            return Some(Self::between(now - from as f64, now - to as f64));
        }
        let age = parse_duration(token)?;
        Some(Self::until(now - age as f64))
    }

    /// Whether `t` falls inside the window.
    pub fn contains(&self, t: f64) -> bool {
        if matches!(self.from, Some(from) if t < from) {
            return false;
        }
        if matches!(self.to, Some(to) if t > to) {
            return false;
        }
        true
    }
}

/// A store query built from a command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Type to search
    pub type_name: String,
    /// Field filters
    pub selector: Selector,
    /// Nth match only
    pub index: Option<usize>,
    /// Time window
    pub window: Option<TimeWindow>,
}

/// Arguments split into plain words and selector tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    /// Plain arguments, in order
    pub args: Vec<String>,
    /// `key==value` filters
    pub gets: Selector,
    /// `key=value` assignments
    pub sets: Setter,
    /// `key-` exclusions
    pub skip: BTreeSet<String>,
    /// Bare numeric index
    pub index: Option<usize>,
    /// Time window
    pub window: Option<TimeWindow>,
    /// `-o` / `--opt` flags
    pub opts: BTreeSet<String>,
}

impl ParsedArgs {
    /// Classify each token.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut parsed = Self::default();
        for token in tokens {
            let token = token.as_ref();
            if let Some(window) = TimeWindow::parse(token) {
                parsed.window = Some(window);
            } else if let Some(key) = token
                .strip_suffix('-')
                .filter(|k| !k.is_empty() && !k.contains('='))
            {
                parsed.skip.insert(key.to_string());
            } else if let Some((key, value)) = token.split_once("==") {
                if !key.is_empty() {
                    parsed.gets.insert(key.to_string(), value.to_string());
                }
            } else if let Some((key, value)) = token.split_once('=') {
                if !key.is_empty() {
                    parsed.sets.insert(key.to_string(), value.to_string());
                }
            } else if let Ok(index) = token.parse::<usize>() {
                parsed.index = Some(index);
            } else if let Some(opt) = token.strip_prefix("--").or_else(|| token.strip_prefix('-')) {
                if !opt.is_empty() {
                    parsed.opts.insert(opt.to_string());
                }
            } else {
                parsed.args.push(token.to_string());
            }
        }
        parsed
    }

    /// Query over `type_name` using the parsed filters.
    pub fn query(&self, type_name: impl Into<String>) -> Query {
        Query {
            type_name: type_name.into(),
            selector: self.gets.clone(),
            index: self.index,
            window: self.window,
        }
    }

    /// Skipped keys as string slices, for [`Record::format`](crate::Record::format).
    pub fn skipped(&self) -> Vec<&str> {
        self.skip.iter().map(String::as_str).collect()
    }
}
