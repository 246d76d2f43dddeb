//! Result export: pretty JSON, tabular CSV with appended columns, and
//! the single-result file. Partial results are exportable at any time,
//! including mid-run or after an abort.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{BatchResult, HotelRecord, TaskStatus};

/// Columns appended after the original input columns in tabular exports.
pub const APPENDED_COLUMNS: &[&str] = &[
    "Status",
    "Error",
    "External ID",
    "Address",
    "Phone",
    "Latitude",
    "Longitude",
    "Description (DE)",
    "Description (EN)",
];

fn record_cells(record: Option<&HotelRecord>) -> Vec<String> {
    match record {
        Some(record) => vec![
            record.external_id.clone(),
            record.combined_address(),
            record.phone.clone(),
            record.latitude.to_string(),
            record.longitude.to_string(),
            record.description_de.clone(),
            record.description_en.clone(),
        ],
        None => vec![String::new(); 7],
    }
}

fn appended_cells(result: &BatchResult) -> Vec<String> {
    let mut cells = vec![
        result.status.as_str().to_string(),
        result.error.clone().unwrap_or_default(),
    ];
    cells.extend(record_cells(result.record.as_ref()));
    cells
}

/// Write batch results as a pretty-printed JSON array.
pub fn write_results_json<W: Write>(results: &[BatchResult], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, results)?;
    Ok(())
}

/// Write batch results as CSV: original input columns plus the appended
/// column set, one row per result.
pub fn write_results_csv<W: Write>(
    input_headers: &[String],
    results: &[BatchResult],
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut headers: Vec<String> = input_headers.to_vec();
    headers.extend(APPENDED_COLUMNS.iter().map(|c| c.to_string()));
    csv_writer.write_record(&headers)?;

    for result in results {
        let mut row: Vec<String> = result.task.source_row.clone();
        // Pad short source rows so appended columns stay aligned.
        row.resize(input_headers.len(), String::new());
        row.extend(appended_cells(result));
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a single generated record as a one-row CSV with the same
/// appended column set.
pub fn write_single_record<W: Write>(record: &HotelRecord, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut headers = vec![
        "Country".to_string(),
        "Hotel Name".to_string(),
        "City".to_string(),
    ];
    headers.extend(APPENDED_COLUMNS.iter().map(|c| c.to_string()));
    csv_writer.write_record(&headers)?;

    let mut row = vec![
        record.country.clone(),
        record.hotel_name.clone(),
        record.city.clone(),
    ];
    row.push(TaskStatus::Success.as_str().to_string());
    row.push(String::new());
    row.extend(record_cells(Some(record)));
    csv_writer.write_record(&row)?;
    csv_writer.flush()?;
    Ok(())
}

/// Sanitize a hotel name into a safe file stem: alphanumerics are kept,
/// everything else becomes `_`, runs are collapsed.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            stem.push(ch);
            last_was_underscore = false;
        } else if !last_was_underscore {
            stem.push('_');
            last_was_underscore = true;
        }
    }
    let stem = stem.trim_matches('_').to_string();
    if stem.is_empty() {
        "hotel".to_string()
    } else {
        stem
    }
}

/// Path for a single-result export file inside `dir`.
pub fn single_export_path(dir: &Path, hotel_name: &str) -> PathBuf {
    dir.join(format!("{}.csv", sanitize_file_stem(hotel_name)))
}
