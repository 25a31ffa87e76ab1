//! The violation engine: a single synchronous fold over telemetry rows.
//!
//! Each row is classified, checked against its category's speed limit, and on
//! violation enriched with positional error against the home-signal index and
//! the closest-signing crew from the roster index. Aggregates are owned by
//! the [`AnalysisResult`] of one run; nothing persists across runs.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::classify::{self, TrainCategory};
use crate::crew::{self, CrewIndex};
use crate::geo::{self, Direction};
use crate::record::{self, Record, keys};
use crate::signals::SignalIndex;

/// One offending telemetry row, fully resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViolationRow {
    pub station: String,
    pub direction: Option<Direction>,
    pub speed: f64,
    pub event_time: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters from the recorded position to the directional home signal.
    /// `None` when direction, station, coordinates, or the signal entry are
    /// unavailable.
    pub error_distance_m: Option<i64>,
    pub crew_name: String,
    pub crew_id: String,
    pub wall_clock: String,
    pub severe: bool,
}

/// All violations recorded for one train identifier within a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrainAggregate {
    pub locomotive: String,
    pub violation_count: usize,
    pub rows: Vec<ViolationRow>,
}

/// Per-category counters, recomputed fully each run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct CategorySummary {
    pub train_count: usize,
    pub violation_count: usize,
    pub max_speed: f64,
}

/// Data point for one violation marker on the map surface.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub severe: bool,
    pub category: TrainCategory,
    pub train: String,
    pub locomotive: String,
    pub station: String,
    pub speed: f64,
    pub error_distance_m: Option<i64>,
    pub crew_name: String,
    pub crew_id: String,
    pub wall_clock: String,
}

/// Bounding box over all marker coordinates, for viewport framing.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    fn of(lat: f64, lon: f64) -> Self {
        BoundingBox {
            min_lat: lat,
            min_lon: lon,
            max_lat: lat,
            max_lon: lon,
        }
    }

    fn include(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lat = self.max_lat.max(lat);
        self.max_lon = self.max_lon.max(lon);
    }
}

/// Aggregates for one train category. Train order is first-violation order,
/// which keeps repeated runs over the same input byte-identical.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryResult {
    pub summary: CategorySummary,
    pub trains: IndexMap<String, TrainAggregate>,
}

/// Complete output of one analysis run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AnalysisResult {
    pub passenger: CategoryResult,
    pub goods: CategoryResult,
    pub markers: Vec<MapMarker>,
    pub bounds: Option<BoundingBox>,
}

/// Runs the full scan over decoded telemetry rows.
///
/// Malformed rows never abort the scan: an unparseable speed or an
/// unclassifiable train skips the row, and every other missing piece degrades
/// to `None`/`"NA"` on the violation it belongs to.
pub fn run(telemetry: &[Record], signals: &SignalIndex, roster: &CrewIndex) -> AnalysisResult {
    let mut result = AnalysisResult::default();

    for row in telemetry {
        let Some(speed) = parse_number(&row.resolve(keys::SPEED)) else {
            trace!("Row skipped: speed not numeric");
            continue;
        };

        let loco = row.resolve(keys::LOCO);
        let train = row.resolve(keys::TRAIN);

        let Some(category) = classify::classify(row) else {
            trace!(train = %train, loco = %loco, "Row skipped: unclassifiable");
            continue;
        };

        if speed <= category.speed_limit() {
            continue;
        }

        let severe = category.is_severe(speed);

        let station = row.resolve(keys::STATION).trim().to_uppercase();
        let latitude = parse_number(&row.resolve(keys::LATITUDE));
        let longitude = parse_number(&row.resolve(keys::LONGITUDE));
        let direction = geo::direction(&train);

        let error_distance_m = match (direction, latitude, longitude) {
            (Some(dir), Some(lat), Some(lon)) if record::is_present(&station) => signals
                .lookup(&station, dir)
                .map(|sig| geo::haversine_meters(lat, lon, sig.latitude, sig.longitude)),
            _ => None,
        };

        let event_time = row.resolve(keys::EVENT_TIME);
        // Passenger duties are rostered by train number; the loco list is
        // consulted only when the train key is absent from the roster
        // entirely. Goods workings are rostered by loco alone.
        let duties = match category {
            TrainCategory::Passenger => roster
                .for_train(&train)
                .or_else(|| roster.for_loco(&loco)),
            TrainCategory::Goods => roster.for_loco(&loco),
        };
        let (crew_name, crew_id) = match duties.and_then(|d| crew::select_by_min_gap(d, &event_time))
        {
            Some(duty) => (duty.crew_name.clone(), duty.crew_id.clone()),
            None => (record::NA.to_string(), record::NA.to_string()),
        };

        let violation = ViolationRow {
            station,
            direction,
            speed,
            event_time,
            latitude,
            longitude,
            error_distance_m,
            crew_name,
            crew_id,
            wall_clock: row.resolve(keys::WALL_TIME),
            severe,
        };

        if let (Some(lat), Some(lon)) = (latitude, longitude) {
            result.markers.push(MapMarker {
                latitude: lat,
                longitude: lon,
                severe,
                category,
                train: train.clone(),
                locomotive: loco.clone(),
                station: violation.station.clone(),
                speed,
                error_distance_m,
                crew_name: violation.crew_name.clone(),
                crew_id: violation.crew_id.clone(),
                wall_clock: violation.wall_clock.clone(),
            });
            match &mut result.bounds {
                Some(bounds) => bounds.include(lat, lon),
                None => result.bounds = Some(BoundingBox::of(lat, lon)),
            }
        }

        let bucket = match category {
            TrainCategory::Passenger => &mut result.passenger,
            TrainCategory::Goods => &mut result.goods,
        };

        bucket.summary.violation_count += 1;
        bucket.summary.max_speed = bucket.summary.max_speed.max(speed);

        let aggregate = bucket
            .trains
            .entry(train)
            .or_insert_with(|| TrainAggregate {
                locomotive: loco,
                violation_count: 0,
                rows: Vec::new(),
            });
        aggregate.violation_count += 1;
        aggregate.rows.push(violation);
    }

    result.passenger.summary.train_count = result.passenger.trains.len();
    result.goods.summary.train_count = result.goods.trains.len();

    debug!(
        passenger_violations = result.passenger.summary.violation_count,
        goods_violations = result.goods.summary.violation_count,
        markers = result.markers.len(),
        "Analysis run complete"
    );

    result
}

fn parse_number(raw: &str) -> Option<f64> {
    let parsed = raw.trim().parse::<f64>().ok()?;
    parsed.is_finite().then_some(parsed)
}
