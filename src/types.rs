//! Core data model: generated records, batch tasks and results, run state.

use serde::{Deserialize, Serialize};

/// Fully populated hotel metadata record returned by a successful
/// generation call. Generation either produces every field or fails;
/// there is no partially populated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    /// Country as supplied in the input.
    pub country: String,
    /// Hotel name as supplied in the input.
    pub hotel_name: String,
    /// Provider-agnostic unique hotel key (GIATA-equivalent code).
    /// May be empty under the best-effort identifier policy.
    pub external_id: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub phone: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// German description, 200-300 word target, Swiss orthography
    /// (every `ß` rewritten as `ss`).
    pub description_de: String,
    /// Faithful English translation of `description_de`.
    pub description_en: String,
}

impl HotelRecord {
    /// Combined single-line address used by the tabular exports.
    pub fn combined_address(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

/// One unit of work in a batch run. Identity is positional: tasks are
/// addressed by their index in the task list and never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchTask {
    pub country: String,
    pub hotel_name: String,
    pub city: Option<String>,
    /// Original input row, preserved verbatim for re-export.
    #[serde(default)]
    pub source_row: Vec<String>,
}

impl BatchTask {
    pub fn new(country: impl Into<String>, hotel_name: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            hotel_name: hotel_name.into(),
            city: None,
            source_row: Vec::new(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
}

/// Outcome status for a single batch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    Error,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Success => "Success",
            TaskStatus::Error => "Error",
        }
    }
}

/// Immutable outcome of one batch task. Either a record with status
/// `Success`, or no record with status `Error` and a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub task: BatchTask,
    pub status: TaskStatus,
    pub record: Option<HotelRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    pub fn success(task: BatchTask, record: HotelRecord) -> Self {
        Self {
            task,
            status: TaskStatus::Success,
            record: Some(record),
            error: None,
        }
    }

    pub fn failure(task: BatchTask, message: impl Into<String>) -> Self {
        Self {
            task,
            status: TaskStatus::Error,
            record: None,
            error: Some(message.into()),
        }
    }
}

/// Lifecycle state of a batch run.
///
/// `Idle -> Running <-> Paused`, `Running -> Completed`,
/// `Running -> Aborted`, `Paused -> Aborted`. Terminal states are
/// `Completed` and `Aborted`; abort is not reversible within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Aborted,
    Completed,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Aborted => "aborted",
            RunState::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Aborted | RunState::Completed)
    }
}

/// Rewrite `ß` as `ss` throughout, per Swiss High German orthography.
/// The capital sharp s (`ẞ`) is folded the same way.
pub fn normalize_swiss_orthography(text: &str) -> String {
    text.replace('ß', "ss").replace('ẞ', "SS")
}

/// Whitespace-separated word count, used to check the description length
/// target.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
