//! CSV decoder for the three input datasets.
//!
//! All three inputs (telemetry, signal reference, crew roster) share the same
//! shape: header-named columns with no fixed schema. Decoding keeps the
//! header order on every row so downstream fuzzy field resolution sees the
//! columns the way the source file ordered them.

use anyhow::Result;
use csv::ReaderBuilder;

use crate::record::Record;

/// Decodes CSV bytes into loosely-keyed records.
///
/// Blank rows are skipped. Ragged rows are tolerated: missing trailing
/// fields decode as empty values.
///
/// # Errors
///
/// Returns an error if the bytes are not decodable CSV (e.g. broken
/// quoting); per-field problems are not errors at this layer.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        rows.push(Record::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), record.get(i).unwrap_or("").to_string())),
        ));
    }

    Ok(rows)
}
