//! Train category classification.
//!
//! Telemetry rows carry no explicit category. Classification runs an ordered
//! rule table: a purely numeric train number is a timetabled passenger
//! service; departmental keywords in the train field mark goods/material
//! movements; otherwise the locomotive number's two-digit class prefix
//! decides.

use serde::Serialize;

use crate::record::{self, Record, keys};

/// Locomotive class prefixes assigned to passenger links.
static PASSENGER_PREFIXES: &[&str] = &["22", "25", "30", "37", "39", "19", "35", "m2"];

/// Locomotive class prefixes assigned to goods links.
static GOODS_PREFIXES: &[&str] = &[
    "23", "27", "28", "31", "32", "33", "34", "41", "42", "43", "44", "51", "60", "65",
];

/// Train-field keywords that mark departmental/material workings.
static GOODS_KEYWORDS: &[&str] = &["motor", "trolley", "pwi", "mt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrainCategory {
    #[serde(rename = "PASSENGER")]
    Passenger,
    #[serde(rename = "GOODS")]
    Goods,
}

impl TrainCategory {
    /// Permitted speed through the section, km/h.
    pub fn speed_limit(self) -> f64 {
        match self {
            TrainCategory::Passenger => 50.0,
            TrainCategory::Goods => 30.0,
        }
    }

    /// Threshold above which a violation is flagged severe, km/h.
    pub fn severe_threshold(self) -> f64 {
        match self {
            TrainCategory::Passenger => 80.0,
            TrainCategory::Goods => 50.0,
        }
    }

    pub fn is_severe(self, speed: f64) -> bool {
        speed >= self.severe_threshold()
    }
}

/// Classifies a telemetry row, or `None` when neither the train field nor the
/// locomotive prefix gives an answer.
///
/// A purely numeric train number always wins, regardless of the locomotive
/// prefix. The prefix fallback applies only to non-numeric or absent train
/// identifiers.
pub fn classify(row: &Record) -> Option<TrainCategory> {
    let train = row.resolve(keys::TRAIN);
    let train = train.trim().to_lowercase();

    if !train.is_empty() && train.chars().all(|c| c.is_ascii_digit()) {
        return Some(TrainCategory::Passenger);
    }

    if GOODS_KEYWORDS.iter().any(|kw| train.contains(kw)) {
        return Some(TrainCategory::Goods);
    }

    by_loco_prefix(&row.resolve(keys::LOCO))
}

/// Looks up a locomotive number's two-character class prefix against the
/// static prefix tables.
pub fn by_loco_prefix(loco: &str) -> Option<TrainCategory> {
    if !record::is_present(loco) {
        return None;
    }

    let prefix: String = loco.chars().take(2).collect::<String>().to_lowercase();

    if PASSENGER_PREFIXES.contains(&prefix.as_str()) {
        Some(TrainCategory::Passenger)
    } else if GOODS_PREFIXES.contains(&prefix.as_str()) {
        Some(TrainCategory::Goods)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn row(train: &str, loco: &str) -> Record {
        Record::from_pairs([("Train No", train), ("Loco No", loco)])
    }

    #[test]
    fn test_numeric_train_is_passenger() {
        assert_eq!(
            classify(&row("12841", "")),
            Some(TrainCategory::Passenger)
        );
    }

    #[test]
    fn test_numeric_train_beats_goods_prefix() {
        // 31xxx is a goods loco class, but a numeric train number wins.
        assert_eq!(
            classify(&row("12841", "31245")),
            Some(TrainCategory::Passenger)
        );
    }

    #[test]
    fn test_keyword_is_goods() {
        assert_eq!(classify(&row("MT-07", "")), Some(TrainCategory::Goods));
        assert_eq!(
            classify(&row("Tower Trolley", "")),
            Some(TrainCategory::Goods)
        );
        assert_eq!(classify(&row("PWI Special", "")), Some(TrainCategory::Goods));
    }

    #[test]
    fn test_loco_prefix_fallback() {
        assert_eq!(classify(&row("", "22387")), Some(TrainCategory::Passenger));
        assert_eq!(classify(&row("", "31245")), Some(TrainCategory::Goods));
        assert_eq!(classify(&row("", "m2001")), Some(TrainCategory::Passenger));
    }

    #[test]
    fn test_non_numeric_train_falls_back_to_prefix() {
        assert_eq!(
            classify(&row("LIGHT ENGINE", "65012")),
            Some(TrainCategory::Goods)
        );
    }

    #[test]
    fn test_unclassifiable_is_none() {
        assert_eq!(classify(&row("", "")), None);
        assert_eq!(classify(&row("", "99123")), None);
        assert_eq!(classify(&row("LIGHT", "NA")), None);
    }

    #[test]
    fn test_limits_and_severity() {
        assert_eq!(TrainCategory::Passenger.speed_limit(), 50.0);
        assert_eq!(TrainCategory::Goods.speed_limit(), 30.0);
        assert!(TrainCategory::Passenger.is_severe(80.0));
        assert!(!TrainCategory::Passenger.is_severe(79.9));
        assert!(TrainCategory::Goods.is_severe(50.0));
        assert!(!TrainCategory::Goods.is_severe(49.0));
    }
}
