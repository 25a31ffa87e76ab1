//! Derived views over an analysis run: leaderboards, per-category reports,
//! and the one-line run record appended to a tracking CSV.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::engine::{AnalysisResult, BoundingBox, CategorySummary, MapMarker, TrainAggregate};

/// One leaderboard entry: a train or station and its violation count.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderEntry {
    pub name: String,
    pub count: usize,
}

/// Everything the review surface needs for one category.
#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub summary: CategorySummary,
    pub top_trains: Vec<LeaderEntry>,
    pub top_stations: Vec<LeaderEntry>,
    pub trains: IndexMap<String, TrainAggregate>,
}

/// Complete run report, serialized as JSON for the consumer.
#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub passenger: CategoryReport,
    pub goods: CategoryReport,
    pub markers: Vec<MapMarker>,
    pub bounds: Option<BoundingBox>,
}

/// Timestamped one-row summary of a run, appended to a tracking CSV.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub passenger_trains: usize,
    pub passenger_violations: usize,
    pub passenger_max_speed: f64,
    pub goods_trains: usize,
    pub goods_violations: usize,
    pub goods_max_speed: f64,
    pub markers: usize,
}

/// Assembles the full report from a finished run. `top_n` bounds both
/// leaderboards (the review surface shows three).
pub fn build_report(result: AnalysisResult, top_n: usize) -> Report {
    let passenger = category_report(result.passenger.summary, result.passenger.trains, top_n);
    let goods = category_report(result.goods.summary, result.goods.trains, top_n);

    Report {
        generated_at: Utc::now(),
        passenger,
        goods,
        markers: result.markers,
        bounds: result.bounds,
    }
}

pub fn run_record(report: &Report) -> RunRecord {
    RunRecord {
        timestamp: report.generated_at,
        passenger_trains: report.passenger.summary.train_count,
        passenger_violations: report.passenger.summary.violation_count,
        passenger_max_speed: report.passenger.summary.max_speed,
        goods_trains: report.goods.summary.train_count,
        goods_violations: report.goods.summary.violation_count,
        goods_max_speed: report.goods.summary.max_speed,
        markers: report.markers.len(),
    }
}

fn category_report(
    summary: CategorySummary,
    trains: IndexMap<String, TrainAggregate>,
    top_n: usize,
) -> CategoryReport {
    let mut top_trains = train_leaders(&trains);
    top_trains.truncate(top_n);
    let mut top_stations = station_leaders(&trains);
    top_stations.truncate(top_n);

    CategoryReport {
        summary,
        top_trains,
        top_stations,
        trains,
    }
}

/// Trains ranked by violation count, descending. The sort is stable, so
/// equal counts keep first-violation order. A train with no usable number
/// displays as `NA / <loco>`.
pub fn train_leaders(trains: &IndexMap<String, TrainAggregate>) -> Vec<LeaderEntry> {
    let mut entries: Vec<LeaderEntry> = trains
        .iter()
        .map(|(train, agg)| LeaderEntry {
            name: display_train(train, &agg.locomotive),
            count: agg.violation_count,
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Stations ranked by per-row violation count, descending, stable. Rows
/// with an empty station field do not count.
pub fn station_leaders(trains: &IndexMap<String, TrainAggregate>) -> Vec<LeaderEntry> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();

    for agg in trains.values() {
        for row in &agg.rows {
            if row.station.is_empty() {
                continue;
            }
            *counts.entry(row.station.as_str()).or_default() += 1;
        }
    }

    let mut entries: Vec<LeaderEntry> = counts
        .into_iter()
        .map(|(station, count)| LeaderEntry {
            name: station.to_string(),
            count,
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

fn display_train(train: &str, loco: &str) -> String {
    if train.is_empty() || train == "NA" {
        format!("NA / {loco}")
    } else {
        train.to_string()
    }
}
