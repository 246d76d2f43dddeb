//! Lodgen: structured hotel metadata generation.
//!
//! Two collaborating components: a content generation client that turns
//! hotel identifying fields into a validated structured record through a
//! generative language model, and a batch runner that drives the client
//! over an ordered task list with pause/resume/abort control and
//! automatic backpressure on rate limits.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod sheet;
pub mod types;

pub use batch::{BatchConfig, BatchController, BatchHandle, BatchRunner, BatchSnapshot, Command};
pub use error::{AppError, GenerateError, InputError, Result};
pub use provider::{ClientOptions, ContentGenerator, GenerationRequest, IdentifierPolicy, StructuredClient};
pub use types::{BatchResult, BatchTask, HotelRecord, RunState, TaskStatus};
