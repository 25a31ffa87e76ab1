//! Direction derivation and great-circle distance.

use serde::Serialize;
use std::fmt;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Logical line direction. Odd train numbers run UP, even run DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DN")]
    Dn,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Dn => write!(f, "DN"),
        }
    }
}

/// Derives direction from the last digit of the train number's parity.
/// `None` when the identifier is empty or does not end in a digit.
pub fn direction(train: &str) -> Option<Direction> {
    let last = train.trim().chars().last()?;
    let digit = last.to_digit(10)?;
    Some(if digit % 2 == 0 {
        Direction::Dn
    } else {
        Direction::Up
    })
}

/// Haversine great-circle distance, rounded to whole meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> i64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let d = EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    d.round() as i64
}
