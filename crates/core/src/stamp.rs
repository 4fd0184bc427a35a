//! Version stamps
//!
//! A [`Stamp`] identifies one immutable version of a record on disk:
//! `<type_name>/<instance_id>/<YYYY-MM-DD>/<HH:MM:SS.ffffff>[.N]`.
//! The rendered path is relative to the store root and always uses `/`.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::time::{self, DATE_FORMAT, SECONDS_FORMAT, TIME_FORMAT};

/// `(type_name, instance_id, creation_date, creation_time)` of a record version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stamp {
    type_name: String,
    instance_id: Uuid,
    date: String,
    time: String,
}

impl Stamp {
    /// Placeholder stamp for a fresh in-memory record: new instance id, current time.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self::at(type_name, Uuid::new_v4(), time::now())
    }

    /// Stamp for a given instance at a given local time.
    pub fn at(type_name: impl Into<String>, instance_id: Uuid, at: NaiveDateTime) -> Self {
        Self {
            type_name: type_name.into(),
            instance_id,
            date: at.format(DATE_FORMAT).to_string(),
            time: at.format(TIME_FORMAT).to_string(),
        }
    }

    /// Stamp for a backdated save: whole seconds plus a numeric disambiguator.
    pub fn backdated(
        type_name: impl Into<String>,
        instance_id: Uuid,
        at: NaiveDateTime,
        disambiguator: u32,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            instance_id,
            date: at.format(DATE_FORMAT).to_string(),
            time: format!("{}.{}", at.format(SECONDS_FORMAT), disambiguator),
        }
    }

    /// Parse a version path. Leading components beyond the last four are ignored.
    pub fn parse(path: &str) -> Result<Self> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        if parts.len() < 4 {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let tail = &parts[parts.len() - 4..];
        let (type_name, id, date, time) = (tail[0], tail[1], tail[2], tail[3]);
        if type_name.is_empty() || date.is_empty() || time.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let instance_id = Uuid::parse_str(id).map_err(|_| Error::InvalidPath(path.to_string()))?;
        Ok(Self {
            type_name: type_name.to_string(),
            instance_id,
            date: date.to_string(),
            time: time.to_string(),
        })
    }

    /// Same instance, moved to a new point in time.
    pub fn advanced(&self, at: NaiveDateTime) -> Self {
        Self::at(self.type_name.clone(), self.instance_id, at)
    }

    /// Qualified type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Instance id, stable across versions
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Date component (`YYYY-MM-DD`)
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Time component (`HH:MM:SS.ffffff` or `HH:MM:SS.N`)
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Date time of this stamp, when the time component is microsecond formatted.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        let text = format!("{} {}", self.date, self.time);
        NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f").ok()
    }

    /// The next instant after this stamp's time, one microsecond later.
    pub fn next_tick(&self) -> Option<NaiveDateTime> {
        self.datetime().map(|at| at + Duration::microseconds(1))
    }

    /// Encoded time as epoch seconds.
    pub fn timestamp(&self) -> f64 {
        time::stamp_time(&self.path())
    }

    /// Relative version path
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.type_name, self.instance_id, self.date, self.time
        )
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
