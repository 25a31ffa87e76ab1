//! Crew roster index and duty resolution.
//!
//! Roster exports list one duty per row, identified by train number and/or
//! locomotive number. The same row is indexed under both identifiers, so a
//! passenger lookup by train and a goods lookup by loco can land on the same
//! duty. The responsible crew for a telemetry event is the duty whose sign-on
//! time is closest to the event time.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::record::{self, Record, keys};

/// Candidate key tables for the crew roster dataset.
mod roster_keys {
    pub const CREW_NAME: &[&str] = &["crewname", "crew name", "name"];
    pub const CREW_ID: &[&str] = &["crewid", "crew id", "emp"];
    pub const SIGN_ON: &[&str] = &["signon", "sign on", "duty on", "on time"];
}

/// Anchor date for time-of-day-only roster values. Rosters exported without
/// a date column still resolve by wall-clock gap against each other.
const TIME_ANCHOR: (i32, u32, u32) = (2000, 1, 1);

/// One crew duty as seen in the roster. The sign-on value stays raw; it is
/// parsed lazily at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyRecord {
    pub crew_name: String,
    pub crew_id: String,
    pub sign_on: String,
}

/// Immutable roster lookup, keyed both ways. Duty lists keep the roster's
/// row order.
#[derive(Debug, Default)]
pub struct CrewIndex {
    by_train: HashMap<String, Vec<DutyRecord>>,
    by_loco: HashMap<String, Vec<DutyRecord>>,
}

impl CrewIndex {
    /// An index with no entries; every lookup misses. Used when the optional
    /// roster file was not supplied.
    pub fn empty() -> Self {
        CrewIndex::default()
    }

    pub fn build(rows: &[Record]) -> Self {
        let mut index = CrewIndex::default();

        for row in rows {
            let train = row.resolve(keys::TRAIN);
            let loco = row.resolve(keys::LOCO);

            let duty = DutyRecord {
                crew_name: row.resolve(roster_keys::CREW_NAME),
                crew_id: row.resolve(roster_keys::CREW_ID),
                sign_on: row.resolve(roster_keys::SIGN_ON),
            };

            if record::is_present(&train) {
                index.by_train.entry(train).or_default().push(duty.clone());
            }
            if record::is_present(&loco) {
                index.by_loco.entry(loco).or_default().push(duty);
            }
        }

        debug!(
            trains = index.by_train.len(),
            locos = index.by_loco.len(),
            "Crew roster index built"
        );
        index
    }

    /// Duties recorded under a train number. `None` when the key itself is
    /// absent, which callers treat differently from an empty match.
    pub fn for_train(&self, train: &str) -> Option<&[DutyRecord]> {
        self.by_train.get(train).map(Vec::as_slice)
    }

    pub fn for_loco(&self, loco: &str) -> Option<&[DutyRecord]> {
        self.by_loco.get(loco).map(Vec::as_slice)
    }

    pub fn train_keys(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_train.iter().map(|(k, v)| (k.as_str(), v.len()))
    }

    pub fn loco_keys(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_loco.iter().map(|(k, v)| (k.as_str(), v.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.by_train.is_empty() && self.by_loco.is_empty()
    }
}

/// Picks the duty whose sign-on time is closest to the event time.
///
/// Unparseable sign-on values make their duty a non-candidate. Ties keep the
/// first-seen duty (strict less-than). `None` when the event time itself is
/// unparseable or nothing qualifies.
pub fn select_by_min_gap<'a>(
    duties: &'a [DutyRecord],
    event_time: &str,
) -> Option<&'a DutyRecord> {
    let event = parse_timestamp(event_time)?;

    let mut best: Option<&DutyRecord> = None;
    let mut min_gap = i64::MAX;

    for duty in duties {
        let Some(sign_on) = parse_timestamp(&duty.sign_on) else {
            continue;
        };

        let gap = (event - sign_on).num_seconds().abs();
        if gap < min_gap {
            min_gap = gap;
            best = Some(duty);
        }
    }

    best
}

/// Lenient timestamp parse covering the formats seen across roster and
/// telemetry exports. Bare times anchor to a fixed date so that time-only
/// values still compare by wall clock.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if !record::is_present(raw) {
        return None;
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d-%m-%Y %H:%M:%S",
        "%d-%m-%Y %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];
    let (y, m, d) = TIME_ANCHOR;
    let anchor = NaiveDate::from_ymd_opt(y, m, d)?;
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(raw, fmt) {
            return Some(anchor.and_time(t));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duty(name: &str, sign_on: &str) -> DutyRecord {
        DutyRecord {
            crew_name: name.to_string(),
            crew_id: format!("ID-{name}"),
            sign_on: sign_on.to_string(),
        }
    }

    fn roster_row(train: &str, loco: &str, name: &str, sign_on: &str) -> Record {
        Record::from_pairs([
            ("Train No", train),
            ("Loco No", loco),
            ("Crew Name", name),
            ("Sign On", sign_on),
        ])
    }

    #[test]
    fn test_build_indexes_both_keys() {
        let rows = vec![roster_row("555", "31245", "A. Kumar", "09:00")];
        let index = CrewIndex::build(&rows);

        assert_eq!(index.for_train("555").unwrap().len(), 1);
        assert_eq!(index.for_loco("31245").unwrap().len(), 1);
        assert_eq!(
            index.for_train("555").unwrap()[0],
            index.for_loco("31245").unwrap()[0]
        );
    }

    #[test]
    fn test_build_skips_absent_keys() {
        let rows = vec![roster_row("", "31245", "B. Das", "10:00")];
        let index = CrewIndex::build(&rows);

        assert!(index.for_train("NA").is_none());
        assert!(index.for_loco("31245").is_some());
    }

    #[test]
    fn test_build_preserves_row_order() {
        let rows = vec![
            roster_row("555", "", "First", "09:00"),
            roster_row("555", "", "Second", "11:00"),
        ];
        let duties = CrewIndex::build(&rows);
        let duties = duties.for_train("555").unwrap();

        assert_eq!(duties[0].crew_name, "First");
        assert_eq!(duties[1].crew_name, "Second");
    }

    #[test]
    fn test_select_min_gap() {
        let duties = [duty("early", "09:00"), duty("late", "11:00")];
        let picked = select_by_min_gap(&duties, "10:50").unwrap();
        assert_eq!(picked.crew_name, "late");
    }

    #[test]
    fn test_select_tie_keeps_first_seen() {
        let duties = [duty("first", "10:00"), duty("second", "12:00")];
        // 11:00 is exactly one hour from both.
        let picked = select_by_min_gap(&duties, "11:00").unwrap();
        assert_eq!(picked.crew_name, "first");
    }

    #[test]
    fn test_select_skips_unparseable_sign_on() {
        let duties = [duty("bad", "n/a"), duty("good", "09:30")];
        let picked = select_by_min_gap(&duties, "18:00").unwrap();
        assert_eq!(picked.crew_name, "good");
    }

    #[test]
    fn test_select_none_cases() {
        assert!(select_by_min_gap(&[], "10:00").is_none());
        assert!(select_by_min_gap(&[duty("a", "09:00")], "not a time").is_none());
        assert!(select_by_min_gap(&[duty("a", "??")], "10:00").is_none());
        assert!(select_by_min_gap(&[duty("a", "09:00")], "NA").is_none());
    }

    #[test]
    fn test_select_with_full_datetimes() {
        let duties = [
            duty("yesterday", "2024-01-01 21:00:00"),
            duty("today", "2024-01-02 07:30:00"),
        ];
        let picked = select_by_min_gap(&duties, "2024-01-02T09:00:00").unwrap();
        assert_eq!(picked.crew_name, "today");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-01-01 10:00").is_some());
        assert!(parse_timestamp("01-02-2024 06:45").is_some());
        assert!(parse_timestamp("01/02/2024 06:45:30").is_some());
        assert!(parse_timestamp("2024-01-01").is_some());
        assert!(parse_timestamp("09:00").is_some());
        assert!(parse_timestamp("09:00:30").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("NA").is_none());
        assert!(parse_timestamp("soon").is_none());
    }

    #[test]
    fn test_bare_times_share_anchor_date() {
        let a = parse_timestamp("09:00").unwrap();
        let b = parse_timestamp("11:00").unwrap();
        assert_eq!((b - a).num_minutes(), 120);
    }
}
