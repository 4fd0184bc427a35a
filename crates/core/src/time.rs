//! Time helpers
//!
//! Version paths encode local wall-clock time as `<YYYY-MM-DD>/<HH:MM:SS.ffffff>`.
//! Ordering and time-window filtering are done on the decoded epoch seconds,
//! never on filesystem ordering.

use chrono::{Local, NaiveDateTime, TimeZone};

/// Date directory format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Time file format (microsecond precision).
pub const TIME_FORMAT: &str = "%H:%M:%S%.6f";
/// Time file format used for backdated saves (a numeric suffix follows).
pub const SECONDS_FORMAT: &str = "%H:%M:%S";

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const YEAR: u64 = 365 * DAY;

/// Current local time, the clock every stamp is taken from.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Current time as epoch seconds.
pub fn now_secs() -> f64 {
    Local::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Epoch seconds of a local date time.
pub fn local_secs(at: &NaiveDateTime) -> f64 {
    Local
        .from_local_datetime(at)
        .earliest()
        .map(|dt| dt.timestamp_micros() as f64 / 1_000_000.0)
        .unwrap_or(0.0)
}

/// Decode the timestamp encoded in the last two components of a version path.
///
/// Anything after the last `.` of the time component is read as a fraction of
/// a second, which covers both microseconds and the disambiguating suffix of
/// backdated saves. Undecodable paths map to `0.0`.
pub fn stamp_time(path: &str) -> f64 {
    let path = path.replace('_', ":");
    let mut parts = path.rsplit('/');
    let (Some(time), Some(date)) = (parts.next(), parts.next()) else {
        return 0.0;
    };
    let (seconds, fraction) = match time.split_once('.') {
        Some((seconds, fraction)) => (seconds, fraction),
        None => (time, ""),
    };
    let text = format!("{} {}", date, seconds);
    let Ok(at) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S") else {
        return 0.0;
    };
    let mut secs = local_secs(&at);
    if !fraction.is_empty() && fraction.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(frac) = format!("0.{}", fraction).parse::<f64>() {
            secs += frac;
        }
    }
    secs
}

/// Render a number of seconds as a compact `1d2h3m4s` string.
///
/// With `short` set, output stops after the most significant pair of units.
pub fn elapsed(seconds: f64, short: bool) -> String {
    let mut nsec = seconds.max(0.0) as u64;
    let years = nsec / YEAR;
    nsec -= years * YEAR;
    let weeks = nsec / WEEK;
    nsec -= weeks * WEEK;
    let mut days = nsec / DAY;
    nsec -= days * DAY;
    let hours = nsec / HOUR;
    nsec -= hours * HOUR;
    let minutes = nsec / MINUTE;
    let secs = nsec - minutes * MINUTE;

    let mut txt = String::new();
    if years > 0 {
        txt.push_str(&format!("{}y", years));
    }
    days += weeks * 7;
    if days > 0 {
        txt.push_str(&format!("{}d", days));
    }
    if years > 0 && short {
        return txt;
    }
    if hours > 0 {
        txt.push_str(&format!("{}h", hours));
    }
    if days > 0 && short {
        return txt;
    }
    if minutes > 0 {
        txt.push_str(&format!("{}m", minutes));
    }
    if hours > 0 && short {
        return txt;
    }
    txt.push_str(&format!("{}s", secs));
    txt
}

/// Parse a duration such as `1w2d`, `3h` or `90m` into seconds.
///
/// Returns `None` unless the whole text is digit groups each followed by one
/// of `y w d h m s`.
pub fn parse_duration(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'y' => YEAR,
            'w' => WEEK,
            'd' => DAY,
            'h' => HOUR,
            'm' => MINUTE,
            's' => 1,
            _ => return None,
        };
        let value: u64 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(unit)?)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}
