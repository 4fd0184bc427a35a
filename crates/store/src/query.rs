//! Queries over the version tree
//!
//! There is no index: every query walks the directory tree of one type and
//! sorts by the time decoded from each path. Two listings exist:
//!
//! - [`Store::list_versions`]: every version of every instance
//! - [`Store::latest_versions`]: the newest version of each instance, picked
//!   by taking the greatest date directory and the greatest file inside it
//!
//! `find`, `all`, `deleted` and `latest` work on the per-instance heads so a
//! tombstoned head hides its instance; `history` works on every version.

use std::fs;
use std::path::Path;

use zbot_core::{stamp_time, Query, Record, Result, Selector, TimeWindow};

use crate::store::Store;

/// Which records a [`Find`] yields, checked after the selector matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Skip tombstoned records
    Live,
    /// Only tombstoned records
    Deleted,
    /// Everything
    Any,
}

impl Store {
    /// Every version path of `type_name`, oldest first.
    pub fn list_versions(&self, type_name: &str, window: Option<&TimeWindow>) -> Result<Vec<String>> {
        if type_name.is_empty() {
            return Ok(Vec::new());
        }
        let type_dir = self.store_dir()?.join(type_name);
        if !type_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        collect_files(&type_dir, type_name, &mut files)?;
        Ok(sort_and_filter(files, window))
    }

    /// Newest version path of each instance of `type_name`, oldest first.
    pub fn latest_versions(
        &self,
        type_name: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<String>> {
        if type_name.is_empty() {
            return Ok(Vec::new());
        }
        let type_dir = self.store_dir()?.join(type_name);
        if !type_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut heads = Vec::new();
        for instance in list_names(&type_dir, true)? {
            let instance_dir = type_dir.join(&instance);
            let Some(date) = list_names(&instance_dir, true)?
                .into_iter()
                .filter(|d| is_date_dir(d))
                .max()
            else {
                continue;
            };
            let Some(file) = list_names(&instance_dir.join(&date), false)?.into_iter().max() else {
                continue;
            };
            heads.push(format!("{}/{}/{}/{}", type_name, instance, date, file));
        }
        Ok(sort_and_filter(heads, window))
    }

    /// The most recently saved record of `type_name`.
    pub fn latest(&self, type_name: &str) -> Result<Option<Record>> {
        match self.latest_versions(type_name, None)?.last() {
            Some(path) => self.hook(path).map(Some),
            None => Ok(None),
        }
    }

    /// Load the most recent version of `record`'s type into it.
    ///
    /// Returns whether a version was found.
    pub fn last(&self, record: &mut Record) -> Result<bool> {
        let type_name = record.type_name().to_string();
        match self.latest_versions(&type_name, None)?.last() {
            Some(path) => {
                self.load(record, path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========================================================================
    // Record queries
    // ========================================================================

    /// Live records of `type_name` matching `selector`, optionally only the
    /// `index`th match, optionally restricted to a time window.
    ///
    /// The directory scan happens now; records are loaded as the iterator is
    /// consumed. Call again to re-scan.
    pub fn find(
        &self,
        type_name: &str,
        selector: Option<&Selector>,
        index: Option<usize>,
        window: Option<&TimeWindow>,
    ) -> Result<Find<'_>> {
        let paths = self.latest_versions(type_name, window)?;
        Ok(Find::new(self, paths, selector.cloned(), index, Visibility::Live))
    }

    /// [`find`](Self::find) driven by a parsed command line.
    pub fn find_query(&self, query: &Query) -> Result<Find<'_>> {
        self.find(
            &query.type_name,
            Some(&query.selector),
            query.index,
            query.window.as_ref(),
        )
    }

    /// All live records of `type_name`.
    pub fn all(&self, type_name: &str) -> Result<Find<'_>> {
        self.find(type_name, None, None, None)
    }

    /// Tombstoned records of `type_name`.
    pub fn deleted(&self, type_name: &str) -> Result<Find<'_>> {
        let paths = self.latest_versions(type_name, None)?;
        Ok(Find::new(self, paths, None, None, Visibility::Deleted))
    }

    /// Every stored version of `type_name`, tombstones included.
    pub fn history(
        &self,
        type_name: &str,
        selector: Option<&Selector>,
        window: Option<&TimeWindow>,
    ) -> Result<Find<'_>> {
        let paths = self.list_versions(type_name, window)?;
        Ok(Find::new(self, paths, selector.cloned(), None, Visibility::Any))
    }
}

// =============================================================================
// Lazy iteration
// =============================================================================

/// Lazy sequence of records produced by a store query.
pub struct Find<'a> {
    store: &'a Store,
    paths: std::vec::IntoIter<String>,
    selector: Selector,
    index: Option<usize>,
    visibility: Visibility,
    matched: usize,
    done: bool,
}

impl<'a> Find<'a> {
    fn new(
        store: &'a Store,
        paths: Vec<String>,
        selector: Option<Selector>,
        index: Option<usize>,
        visibility: Visibility,
    ) -> Self {
        Self {
            store,
            paths: paths.into_iter(),
            selector: selector.unwrap_or_default(),
            index,
            visibility,
            matched: 0,
            done: false,
        }
    }
}

impl Iterator for Find<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for path in self.paths.by_ref() {
            let record = match self.store.hook(&path) {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            if !self.selector.is_empty() && !record.search(&self.selector) {
                continue;
            }
            let visible = match self.visibility {
                Visibility::Live => !record.is_deleted(),
                Visibility::Deleted => record.is_deleted(),
                Visibility::Any => true,
            };
            if !visible {
                continue;
            }
            let nr = self.matched;
            self.matched += 1;
            match self.index {
                Some(index) if nr < index => continue,
                Some(_) => {
                    self.done = true;
                    return Some(Ok(record));
                }
                None => return Some(Ok(record)),
            }
        }
        self.done = true;
        None
    }
}

// =============================================================================
// Directory scanning
// =============================================================================

fn is_date_dir(name: &str) -> bool {
    name.matches('-').count() == 2
}

fn sort_and_filter(paths: Vec<String>, window: Option<&TimeWindow>) -> Vec<String> {
    let mut timed: Vec<(f64, String)> = paths
        .into_iter()
        .map(|p| (stamp_time(&p), p))
        .filter(|(t, _)| window.map_or(true, |w| w.contains(*t)))
        .collect();
    timed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    timed.into_iter().map(|(_, p)| p).collect()
}

/// Names of the subdirectories (`dirs`) or files of `dir`, hidden entries skipped.
fn list_names(dir: &Path, dirs: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_dir() == dirs {
            names.push(name);
        }
    }
    Ok(names)
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let rel = format!("{}/{}", prefix, name);
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), &rel, out)?;
        } else {
            out.push(rel);
        }
    }
    Ok(())
}
