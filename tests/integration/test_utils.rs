//! Shared test fixtures: a scripted content generator that replays a
//! fixed outcome sequence per hotel, and snapshot polling helpers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use lodgen::batch::BatchHandle;
use lodgen::error::GenerateError;
use lodgen::provider::{ContentGenerator, GenerationRequest};
use lodgen::types::{HotelRecord, RunState};

/// Scripted outcome for one generation call.
#[derive(Debug, Clone)]
pub enum Outcome {
    Ok,
    RateLimited,
    Empty,
    Fail(&'static str),
}

/// Replays scripted outcomes per hotel name; unscripted calls succeed.
/// Records every call for assertion.
pub struct ScriptedGenerator {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn script(self: &Arc<Self>, hotel_name: &str, outcomes: Vec<Outcome>) -> Arc<Self> {
        self.scripts
            .lock()
            .insert(hotel_name.to_string(), outcomes.into());
        Arc::clone(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, hotel_name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|name| name.as_str() == hotel_name)
            .count()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<HotelRecord, GenerateError> {
        self.calls.lock().push(request.hotel_name.clone());
        let outcome = self
            .scripts
            .lock()
            .get_mut(&request.hotel_name)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Outcome::Ok);
        match outcome {
            Outcome::Ok => Ok(sample_record(request)),
            Outcome::RateLimited => Err(GenerateError::RateLimited("quota exhausted".to_string())),
            Outcome::Empty => Err(GenerateError::EmptyResponse),
            Outcome::Fail(message) => Err(GenerateError::Failed(message.to_string())),
        }
    }
}

pub fn sample_record(request: &GenerationRequest) -> HotelRecord {
    HotelRecord {
        country: request.country.clone(),
        hotel_name: request.hotel_name.clone(),
        external_id: "10001".to_string(),
        street: "Bahnhofstrasse 1".to_string(),
        postal_code: "8001".to_string(),
        city: request.city.clone().unwrap_or_else(|| "Zürich".to_string()),
        phone: "+41 44 000 00 00".to_string(),
        latitude: 47.3769,
        longitude: 8.5417,
        description_de: "Ein ruhiges Hotel an bester Lage.".to_string(),
        description_en: "A quiet hotel in a prime location.".to_string(),
    }
}

/// Poll the snapshot until the run reaches `target` or the attempt
/// budget runs out. Uses tokio's (auto-advancing) clock.
pub async fn wait_for_state(handle: &BatchHandle, target: RunState) {
    for _ in 0..10_000 {
        if handle.snapshot().state == target {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!(
        "run never reached state {:?}; last state {:?}",
        target,
        handle.snapshot().state
    );
}
