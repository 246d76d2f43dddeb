//! Tabular task ingestion.
//!
//! Row 1 is the header row. Column roles are detected through
//! case-insensitive, whitespace-trimmed alias sets; rows with a blank
//! country or hotel name are filtered out before the run starts and
//! never appear in progress totals. Missing required columns or zero
//! usable rows is fatal and reported before any run starts.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::InputError;
use crate::types::BatchTask;

const COUNTRY_ALIASES: &[&str] = &["country", "land"];
const HOTEL_ALIASES: &[&str] = &["hotel name", "hotelname", "hotel"];
const CITY_ALIASES: &[&str] = &["city", "stadt", "ort"];

/// Parsed task sheet: the original headers (for re-export) and the
/// validated task list.
#[derive(Debug, Clone)]
pub struct TaskSheet {
    pub headers: Vec<String>,
    pub tasks: Vec<BatchTask>,
}

/// Resolved header column indices.
#[derive(Debug, Clone, Copy)]
struct ColumnRoles {
    country: usize,
    hotel_name: usize,
    city: Option<usize>,
}

fn matches_alias(header: &str, aliases: &[&str]) -> bool {
    let normalized = header.trim().to_lowercase();
    aliases.contains(&normalized.as_str())
}

fn detect_columns(headers: &[String]) -> Result<ColumnRoles, InputError> {
    let find = |aliases: &[&str]| {
        headers
            .iter()
            .position(|header| matches_alias(header, aliases))
    };

    let country = find(COUNTRY_ALIASES)
        .ok_or(InputError::MissingColumn("\"Country\" / \"Land\""))?;
    let hotel_name = find(HOTEL_ALIASES)
        .ok_or(InputError::MissingColumn("\"Hotel Name\" / \"Hotelname\" / \"Hotel\""))?;
    let city = find(CITY_ALIASES);

    Ok(ColumnRoles {
        country,
        hotel_name,
        city,
    })
}

/// Parse tasks from CSV content. The reader must include the header row.
pub fn parse_tasks<R: Read>(reader: R) -> Result<TaskSheet, InputError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| InputError::Read(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let roles = detect_columns(&headers)?;

    let mut tasks = Vec::new();
    let mut skipped = 0usize;
    for row in csv_reader.records() {
        let row = row.map_err(|e| InputError::Read(e.to_string()))?;
        let cell = |index: usize| row.get(index).unwrap_or("").trim().to_string();

        let country = cell(roles.country);
        let hotel_name = cell(roles.hotel_name);
        if country.is_empty() || hotel_name.is_empty() {
            skipped += 1;
            continue;
        }

        let city = roles
            .city
            .map(|index| cell(index))
            .filter(|city| !city.is_empty());

        tasks.push(BatchTask {
            country,
            hotel_name,
            city,
            source_row: row.iter().map(str::to_string).collect(),
        });
    }

    if tasks.is_empty() {
        return Err(InputError::NoDataRows);
    }

    debug!(
        tasks = tasks.len(),
        skipped, "parsed task sheet"
    );
    Ok(TaskSheet { headers, tasks })
}

/// Load tasks from a CSV file on disk.
pub fn load_tasks(path: &Path) -> Result<TaskSheet, InputError> {
    let file = std::fs::File::open(path)
        .map_err(|e| InputError::Read(format!("{}: {}", path.display(), e)))?;
    parse_tasks(file)
}
