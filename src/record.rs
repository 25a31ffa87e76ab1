//! Loosely-keyed telemetry rows and fuzzy field resolution.
//!
//! Source CSVs come from several upstream systems that disagree on column
//! naming ("Loco No.", "LOCO NO", "Locomotive" ...). A [`Record`] keeps the
//! row's columns in header order and resolves logical fields by normalized
//! substring match against a candidate key list.

/// Candidate key tables for the telemetry dataset, in priority order.
pub mod keys {
    pub const TRAIN: &[&str] = &["train"];
    pub const LOCO: &[&str] = &["loco"];
    pub const SPEED: &[&str] = &["speed"];
    pub const STATION: &[&str] = &["station"];
    pub const LATITUDE: &[&str] = &["lat"];
    pub const LONGITUDE: &[&str] = &["lon"];
    pub const EVENT_TIME: &[&str] = &["event"];
    pub const WALL_TIME: &[&str] = &["time"];
}

/// Sentinel returned when a field is missing or empty. Distinct from an
/// unset value: it propagates through comparisons downstream.
pub const NA: &str = "NA";

/// One decoded CSV row. Column order is the header order of the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Record {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Resolves a logical field by fuzzy key match.
    ///
    /// Scans columns in header order; each column name is lowercased and
    /// stripped of whitespace and periods, then checked for *containment* of
    /// each candidate in priority order. The first column matching any
    /// candidate wins. An empty matched value, or no match at all, yields
    /// [`NA`].
    pub fn resolve(&self, candidates: &[&str]) -> String {
        for (key, value) in &self.fields {
            let normalized = normalize_key(key);
            for candidate in candidates {
                if normalized.contains(candidate) {
                    return if value.is_empty() {
                        NA.to_string()
                    } else {
                        value.clone()
                    };
                }
            }
        }
        NA.to_string()
    }

    /// Exact column lookup (case-insensitive, trimmed). Used for datasets
    /// with a fixed documented schema, like the signal-definition file.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// True when a resolved value carries usable content, i.e. neither empty nor
/// the [`NA`] sentinel.
pub fn is_present(value: &str) -> bool {
    !value.is_empty() && value != NA
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect::<String>()
        .to_lowercase()
}
