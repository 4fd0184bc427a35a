//! Versioned object store
//!
//! Every save writes a new, read-only file under
//! `<workdir>/store/<type>/<instance id>/<date>/<time>`; existing versions are
//! never modified. Saves are serialized by one process-wide lock so stamps are
//! assigned and files written without interleaving. Reads take no lock and
//! always go to disk.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde_json::Value as Json;
use tracing::{debug, warn};

use zbot_core::{time, Error, Record, Result, Stamp, TypeRegistry};

/// Name of the store subtree inside the working directory.
pub const STORE_DIR: &str = "store";

const BACKDATE_SUFFIX_RANGE: u32 = 100_000;

/// File-backed, append-only record store
pub struct Store {
    workdir: RwLock<Option<PathBuf>>,
    save_lock: Mutex<()>,
    types: TypeRegistry,
}

impl Store {
    /// Create a store with no working directory yet.
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            workdir: RwLock::new(None),
            save_lock: Mutex::new(()),
            types,
        }
    }

    /// Create a store rooted at `workdir`.
    pub fn open(workdir: impl Into<PathBuf>, types: TypeRegistry) -> Result<Self> {
        let store = Self::new(types);
        store.set_workdir(workdir)?;
        Ok(store)
    }

    /// Point the store at a working directory, creating `store/` inside it.
    pub fn set_workdir(&self, workdir: impl Into<PathBuf>) -> Result<()> {
        let workdir = workdir.into();
        create_dirs(&workdir.join(STORE_DIR))?;
        debug!(workdir = %workdir.display(), "store configured");
        *self.workdir.write() = Some(workdir);
        Ok(())
    }

    /// Working directory, or `StoreUnconfigured`.
    pub fn workdir(&self) -> Result<PathBuf> {
        self.workdir.read().clone().ok_or(Error::StoreUnconfigured)
    }

    /// Root of the version tree.
    pub fn store_dir(&self) -> Result<PathBuf> {
        Ok(self.workdir()?.join(STORE_DIR))
    }

    /// Absolute location of a version path.
    pub fn version_file(&self, path: &str) -> Result<PathBuf> {
        Ok(self.store_dir()?.join(path))
    }

    /// The type registry used to rebuild records
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    // ========================================================================
    // Versions
    // ========================================================================

    /// Save `record` as a new version stamped with the current time.
    ///
    /// Returns the new version path.
    pub fn save(&self, record: &mut Record) -> Result<String> {
        self.save_at(record, None)
    }

    /// Save `record`, optionally backdated to `at`.
    ///
    /// Backdated versions get whole-second times plus a random numeric suffix.
    /// Either way the instance id is kept and the written file is never reused:
    /// a colliding path moves the stamp forward (or draws a new suffix).
    pub fn save_at(&self, record: &mut Record, at: Option<NaiveDateTime>) -> Result<String> {
        let root = self.store_dir()?;
        let _guard = self.save_lock.lock();

        let previous = record.stamp().clone();
        let type_name = record.type_name().to_string();
        let mut stamp = match at {
            Some(at) => backdated(&type_name, &previous, at),
            None => {
                let mut now = time::now();
                if let Some(next) = previous.next_tick() {
                    now = now.max(next);
                }
                Stamp::at(type_name.clone(), previous.instance_id(), now)
            }
        };
        while root.join(stamp.path()).exists() {
            stamp = match (at, stamp.next_tick()) {
                (Some(at), _) => backdated(&type_name, &previous, at),
                (None, Some(next)) => stamp.advanced(next),
                (None, None) => stamp.advanced(time::now()),
            };
        }

        record.set_stamp(stamp.clone());
        let path = stamp.path();
        let target = root.join(&path);
        if let Err(e) = write_version(&target, &record.to_json()) {
            record.set_stamp(previous);
            return Err(e);
        }
        debug!(path = %path, "saved version");
        Ok(path)
    }

    /// Load one version into `record` in place.
    ///
    /// Fields from the file are merged over the record's fields and the record
    /// adopts the version's stamp. A file that does not decode as JSON is logged and
    /// skipped, leaving the record unchanged. Nested objects of an unregistered
    /// type fail with `NoSuchType`.
    pub fn load(&self, record: &mut Record, path: &str) -> Result<()> {
        let stamp = Stamp::parse(path)?;
        let file = self.version_file(path)?;
        let content = fs::read(&file)?;
        let object = match serde_json::from_slice::<Json>(&content) {
            Ok(Json::Object(object)) => object,
            Ok(other) => {
                warn!(path = %path, kind = ?other, "version file is not a JSON object, skipping");
                return Ok(());
            }
            Err(e) => {
                warn!(path = %path, error = %e, "corrupt version file, skipping");
                return Ok(());
            }
        };
        let fields = self.types.decode_fields(object)?;
        record.update(fields);
        record.set_stamp(stamp);
        Ok(())
    }

    /// Rebuild the record stored at `path`, choosing its shape from the path.
    pub fn hook(&self, path: &str) -> Result<Record> {
        let stamp = Stamp::parse(path)?;
        let mut record = self.types.create(stamp.type_name())?;
        self.load(&mut record, path)?;
        Ok(record)
    }

    /// Type directories present on disk.
    pub fn stored_types(&self) -> Result<Vec<String>> {
        let root = self.store_dir()?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && entry.file_type()?.is_dir() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Write path
// =============================================================================

fn backdated(type_name: &str, previous: &Stamp, at: NaiveDateTime) -> Stamp {
    let suffix = rand::thread_rng().gen_range(0..BACKDATE_SUFFIX_RANGE);
    Stamp::backdated(type_name, previous.instance_id(), at, suffix)
}

/// Write-fsync-rename a version file, then make it read-only.
fn write_version(target: &Path, json: &Json) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| Error::InvalidPath(target.display().to_string()))?;
    create_dirs(parent)?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&temp_path)?;
    serde_json::to_writer(&mut file, json)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);

    set_read_only(&temp_path)?;
    fs::rename(&temp_path, target)?;

    let dir_fd = File::open(parent)?;
    dir_fd.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn set_read_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o444))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_read_only(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(unix)]
pub(crate) fn create_dirs(path: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn create_dirs(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}
