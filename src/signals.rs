//! Home-signal reference index.
//!
//! Built once per load of the signal-definition dataset. Only rows typed
//! `HOME` participate; each contributes the reference coordinate for one
//! `(station, direction)` approach. Lookup during analysis is exact-key only.

use std::collections::HashMap;

use tracing::debug;

use crate::geo::Direction;
use crate::record::Record;

/// Reference coordinate of a directional home signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRef {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable lookup from `STATION|DIR` to the home-signal coordinate.
#[derive(Debug, Default)]
pub struct SignalIndex {
    map: HashMap<String, SignalRef>,
}

impl SignalIndex {
    /// An index with no entries; every lookup misses. Used when the optional
    /// signal-definition file was not supplied.
    pub fn empty() -> Self {
        SignalIndex::default()
    }

    /// Builds the index from decoded signal-definition rows.
    ///
    /// Station names are trimmed and uppercased. Direction comes from a
    /// `DIRN` column when it carries an UP/DN marker, otherwise from the
    /// `-UP`/`-DN` suffix of a combined `Station-DIR` column. Rows with an
    /// undecidable direction or non-numeric coordinates are dropped; a
    /// later row with the same key overwrites an earlier one.
    pub fn build(rows: &[Record]) -> Self {
        let mut map = HashMap::new();

        for row in rows {
            let is_home = row
                .get("Type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("HOME"));
            if !is_home {
                continue;
            }

            let station = row
                .get("Station")
                .map(|s| s.trim().to_uppercase())
                .unwrap_or_default();
            if station.is_empty() {
                continue;
            }

            let Some(direction) = row_direction(row) else {
                debug!(station = %station, "Signal row has no decidable direction, dropped");
                continue;
            };

            let Some(latitude) = parse_coord(row.get("Latitude")) else {
                continue;
            };
            let Some(longitude) = parse_coord(row.get("Longitude")) else {
                continue;
            };

            map.insert(
                signal_key(&station, direction),
                SignalRef {
                    latitude,
                    longitude,
                },
            );
        }

        debug!(entries = map.len(), "Signal reference index built");
        SignalIndex { map }
    }

    /// Exact lookup; the station must already be trimmed and uppercased.
    pub fn lookup(&self, station: &str, direction: Direction) -> Option<&SignalRef> {
        self.map.get(&signal_key(station, direction))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalRef)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn signal_key(station: &str, direction: Direction) -> String {
    format!("{station}|{direction}")
}

/// Two direction-encoding conventions exist in the field data: a dedicated
/// `DIRN` column, and a combined `Station-DIR` column like `HWH-UP`.
fn row_direction(row: &Record) -> Option<Direction> {
    if let Some(dirn) = row.get("DIRN") {
        let dirn = dirn.trim().to_uppercase();
        if dirn.contains("UP") {
            return Some(Direction::Up);
        }
        if dirn.contains("DN") {
            return Some(Direction::Dn);
        }
    }

    if let Some(combined) = row.get("Station-DIR") {
        let combined = combined.trim().to_uppercase();
        if combined.ends_with("-UP") {
            return Some(Direction::Up);
        }
        if combined.ends_with("-DN") {
            return Some(Direction::Dn);
        }
    }

    None
}

fn parse_coord(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
}
