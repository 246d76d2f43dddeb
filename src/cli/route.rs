//! CLI route: dispatches parsed commands to the library and renders
//! their output.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, Table};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use crate::batch::{BatchRunner, BatchSnapshot};
use crate::cli::parse::Commands;
use crate::config::LodgenConfig;
use crate::error::{AppError, Result};
use crate::export;
use crate::provider::{ContentGenerator, GenerationRequest, StructuredClient};
use crate::sheet;
use crate::types::{HotelRecord, RunState, TaskStatus};

/// Snapshot poll cadence for the batch progress display.
const MONITOR_INTERVAL: Duration = Duration::from_millis(200);

/// Runtime context for CLI execution: validated configuration plus the
/// generation client built from it.
pub struct RunContext {
    config: LodgenConfig,
}

impl RunContext {
    pub fn new(config: LodgenConfig) -> Self {
        Self { config }
    }

    /// Execute a CLI command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| AppError::Config(format!("failed to create async runtime: {}", e)))?;

        match command {
            Commands::Generate {
                country,
                hotel_name,
                city,
                external_id,
                source_urls,
                out_dir,
                format,
            } => {
                let request = GenerationRequest {
                    country: country.clone(),
                    hotel_name: hotel_name.clone(),
                    city: city.clone(),
                    external_id: external_id.clone(),
                    source_urls: source_urls.clone(),
                };
                request.validate()?;

                let client = self.build_client()?;
                let record = runtime.block_on(client.generate(&request))?;

                if let Some(dir) = out_dir {
                    let path = self.write_single_export(dir, &record)?;
                    info!(path = %path.display(), "wrote single-result export");
                }

                match format.as_str() {
                    "json" => Ok(serde_json::to_string_pretty(&record)?),
                    _ => Ok(format_record_text(&record)),
                }
            }
            Commands::Batch {
                input,
                json,
                csv,
                cooldown_secs,
            } => {
                let task_sheet = sheet::load_tasks(input)?;
                let client: Arc<dyn ContentGenerator> = Arc::new(self.build_client()?);
                let cooldown = cooldown_secs
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| self.config.batch.cooldown());

                let (runner, controller) = BatchRunner::new(
                    client,
                    task_sheet.tasks.clone(),
                    self.config.batch.runner_config(),
                );
                let handle = runner.handle();

                let snapshot = runtime.block_on(async move {
                    let run = tokio::spawn(runner.run());
                    let mut printed = 0usize;
                    loop {
                        tokio::time::sleep(MONITOR_INTERVAL).await;
                        let snapshot = handle.snapshot();

                        for result in snapshot.results.iter().skip(printed) {
                            let status = match result.status {
                                TaskStatus::Success => "ok".green().to_string(),
                                TaskStatus::Error => "failed".red().to_string(),
                            };
                            println!(
                                "[{}/{}] {} - {}",
                                printed + 1,
                                snapshot.total,
                                result.task.hotel_name,
                                status
                            );
                            printed += 1;
                        }

                        if snapshot.state == RunState::Paused {
                            if let Some(notice) = &snapshot.notice {
                                warn!(notice = %notice, cooldown_secs = cooldown.as_secs(),
                                    "rate limited, cooling down before resume");
                                println!(
                                    "{} {} (resuming in {}s)",
                                    "paused:".yellow(),
                                    notice,
                                    cooldown.as_secs()
                                );
                            }
                            tokio::time::sleep(cooldown).await;
                            controller.resume();
                        }

                        if snapshot.state.is_terminal() {
                            break;
                        }
                    }
                    // The runner has observed the terminal state; its
                    // final snapshot is authoritative.
                    run.await.unwrap_or(handle.snapshot())
                });

                if let Some(path) = json {
                    let file = std::fs::File::create(path)?;
                    export::write_results_json(&snapshot.results, file)?;
                    info!(path = %path.display(), "wrote JSON export");
                }
                if let Some(path) = csv {
                    let file = std::fs::File::create(path)?;
                    export::write_results_csv(&task_sheet.headers, &snapshot.results, file)?;
                    info!(path = %path.display(), "wrote CSV export");
                }

                Ok(format_batch_summary(&snapshot))
            }
            Commands::Init { force } => {
                let cwd = std::env::current_dir()?;
                let path = crate::config::ConfigLoader::write_starter(&cwd, *force)?;
                Ok(format!("Wrote {}", path.display()))
            }
        }
    }

    fn build_client(&self) -> Result<StructuredClient> {
        let options = self
            .config
            .provider
            .client_options(self.config.batch.identifier_policy)?;
        StructuredClient::new(options).map_err(AppError::from)
    }

    fn write_single_export(&self, dir: &PathBuf, record: &HotelRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = export::single_export_path(dir, &record.hotel_name);
        let file = std::fs::File::create(&path)?;
        export::write_single_record(record, file)?;
        Ok(path)
    }
}

fn format_record_text(record: &HotelRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", record.hotel_name.bold()));
    out.push_str(&format!("  Country:      {}\n", record.country));
    out.push_str(&format!("  External ID:  {}\n", record.external_id));
    out.push_str(&format!("  Address:      {}\n", record.combined_address()));
    out.push_str(&format!("  Phone:        {}\n", record.phone));
    out.push_str(&format!(
        "  Coordinates:  {}, {}\n",
        record.latitude, record.longitude
    ));
    out.push_str(&format!("\n{}\n{}\n", "Description (DE)".bold(), record.description_de));
    out.push_str(&format!("\n{}\n{}\n", "Description (EN)".bold(), record.description_en));
    out
}

fn format_batch_summary(snapshot: &BatchSnapshot) -> String {
    let succeeded = snapshot
        .results
        .iter()
        .filter(|r| r.status == TaskStatus::Success)
        .count();
    let failed = snapshot.results.len() - succeeded;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Hotel", "Status", "External ID", "Error"]);
    for result in &snapshot.results {
        table.add_row(vec![
            result.task.hotel_name.clone(),
            result.status.as_str().to_string(),
            result
                .record
                .as_ref()
                .map(|record| record.external_id.clone())
                .unwrap_or_default(),
            result.error.clone().unwrap_or_default(),
        ]);
    }

    format!(
        "{}\n\nBatch {}: {} succeeded, {} failed ({}/{} resolved)",
        table,
        snapshot.state.as_str(),
        succeeded,
        failed,
        snapshot.current,
        snapshot.total
    )
}
