//! Integration tests for the batch runner state machine.
//!
//! Tests cover:
//! - Sequential processing and result ordering
//! - Rate-limit backpressure (pause without cursor advance)
//! - Pause/resume/abort control
//! - Terminal-state permanence

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use lodgen::batch::{BatchConfig, BatchController, BatchRunner};
use lodgen::error::GenerateError;
use lodgen::provider::{ContentGenerator, GenerationRequest};
use lodgen::types::{BatchTask, HotelRecord, RunState, TaskStatus};

use super::test_utils::{sample_record, wait_for_state, Outcome, ScriptedGenerator};

fn fast_config() -> BatchConfig {
    BatchConfig {
        poll_interval: Duration::from_millis(10),
    }
}

fn tasks(names: &[(&str, &str)]) -> Vec<BatchTask> {
    names
        .iter()
        .map(|(country, name)| BatchTask::new(*country, *name))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn all_successes_complete_in_order() {
    let generator = ScriptedGenerator::new();
    let (runner, _controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B"), ("DE", "Hotel C")]),
        fast_config(),
    );

    let snapshot = runner.run().await;

    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!((snapshot.current, snapshot.total), (3, 3));
    assert_eq!(snapshot.results.len(), 3);
    let names: Vec<&str> = snapshot
        .results
        .iter()
        .map(|r| r.task.hotel_name.as_str())
        .collect();
    assert_eq!(names, vec!["Hotel A", "Hotel B", "Hotel C"]);
    for result in &snapshot.results {
        assert_eq!(result.status, TaskStatus::Success);
        assert!(result.record.is_some());
        assert!(result.error.is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn permanent_failure_advances_cursor_with_message() {
    let generator =
        ScriptedGenerator::new().script("Hotel B", vec![Outcome::Fail("schema mismatch")]);
    let (runner, _controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B"), ("DE", "Hotel C")]),
        fast_config(),
    );

    let snapshot = runner.run().await;

    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!(snapshot.results.len(), 3);
    let failed = &snapshot.results[1];
    assert_eq!(failed.status, TaskStatus::Error);
    assert!(failed.record.is_none());
    assert!(failed.error.as_deref().unwrap().contains("schema mismatch"));
    // The failed task was attempted exactly once; processing continued.
    assert_eq!(generator.calls_for("Hotel B"), 1);
    assert_eq!(generator.calls_for("Hotel C"), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_response_is_terminal_for_the_task_only() {
    let generator = ScriptedGenerator::new().script("Hotel A", vec![Outcome::Empty]);
    let (runner, _controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B")]),
        fast_config(),
    );

    let snapshot = runner.run().await;

    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!(snapshot.results[0].status, TaskStatus::Error);
    assert_eq!(snapshot.results[1].status, TaskStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_pauses_without_advancing_cursor() {
    // Spec example: Hotel A succeeds, Hotel B is rate limited once and
    // succeeds on retry.
    let generator = ScriptedGenerator::new()
        .script("Hotel B", vec![Outcome::RateLimited, Outcome::Ok]);
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("Switzerland", "Hotel A"), ("France", "Hotel B")]),
        fast_config(),
    );
    let handle = runner.handle();
    let run = tokio::spawn(runner.run());

    wait_for_state(&handle, RunState::Paused).await;
    let paused = handle.snapshot();
    assert_eq!(paused.current, 1, "rate limit must not advance the cursor");
    assert!(paused.notice.as_deref().unwrap().contains("rate limit"));

    controller.resume();
    let snapshot = run.await.unwrap();

    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!((snapshot.current, snapshot.total), (2, 2));
    assert_eq!(snapshot.results.len(), 2);
    assert_eq!(snapshot.results[0].status, TaskStatus::Success);
    assert_eq!(snapshot.results[1].status, TaskStatus::Success);
    assert!(snapshot.notice.is_none(), "notice is cleared on resume");
    // Exactly two generation calls were made for Hotel B.
    assert_eq!(generator.calls_for("Hotel B"), 2);
    assert_eq!(generator.calls_for("Hotel A"), 1);
}

#[tokio::test(start_paused = true)]
async fn repeated_rate_limits_retry_the_same_task() {
    let generator = ScriptedGenerator::new().script(
        "Hotel A",
        vec![Outcome::RateLimited, Outcome::RateLimited, Outcome::RateLimited, Outcome::Ok],
    );
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A")]),
        fast_config(),
    );
    let handle = runner.handle();
    let run = tokio::spawn(runner.run());

    // Each pause is identified by the number of attempts made so far;
    // waiting on the state alone could confuse consecutive pauses.
    for attempt in 1..=3 {
        loop {
            if generator.calls_for("Hotel A") == attempt
                && handle.snapshot().state == RunState::Paused
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        controller.resume();
    }
    let snapshot = run.await.unwrap();

    assert_eq!(snapshot.state, RunState::Completed);
    // One entry for the task despite four attempts.
    assert_eq!(snapshot.results.len(), 1);
    assert_eq!(snapshot.results[0].status, TaskStatus::Success);
    assert_eq!(generator.calls_for("Hotel A"), 4);
}

#[tokio::test(start_paused = true)]
async fn explicit_pause_suspends_before_next_task() {
    let generator = ScriptedGenerator::new();
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B")]),
        fast_config(),
    );
    let handle = runner.handle();

    // Pause is already requested when the run starts: no task may begin.
    controller.pause();
    let run = tokio::spawn(runner.run());

    wait_for_state(&handle, RunState::Paused).await;
    assert_eq!(generator.calls().len(), 0);

    controller.resume();
    let snapshot = run.await.unwrap();
    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!(snapshot.results.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn abort_while_paused_halts_permanently() {
    let generator = ScriptedGenerator::new()
        .script("Hotel B", vec![Outcome::RateLimited]);
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B"), ("DE", "Hotel C")]),
        fast_config(),
    );
    let handle = runner.handle();
    let run = tokio::spawn(runner.run());

    wait_for_state(&handle, RunState::Paused).await;
    controller.abort();
    let snapshot = run.await.unwrap();

    assert_eq!(snapshot.state, RunState::Aborted);
    // Hotel A resolved, Hotel B attempted once, Hotel C never sent.
    assert_eq!(snapshot.results.len(), 1);
    assert_eq!(generator.calls_for("Hotel B"), 1);
    assert_eq!(generator.calls_for("Hotel C"), 0);
}

/// Aborts mid-call on the first invocation, then answers with a rate
/// limit. The runner must honor the abort instead of parking in the
/// rate-limit pause.
struct AbortingGenerator {
    controller: Mutex<Option<BatchController>>,
    fired: AtomicBool,
    calls: AtomicUsize,
}

#[async_trait]
impl ContentGenerator for AbortingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<HotelRecord, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.fired.swap(true, Ordering::SeqCst) {
            if let Some(controller) = &*self.controller.lock() {
                controller.abort();
            }
            return Err(GenerateError::RateLimited("quota exhausted".to_string()));
        }
        Ok(sample_record(request))
    }
}

#[tokio::test(start_paused = true)]
async fn abort_during_in_flight_call_wins_over_rate_limit_pause() {
    let generator = Arc::new(AbortingGenerator {
        controller: Mutex::new(None),
        fired: AtomicBool::new(false),
        calls: AtomicUsize::new(0),
    });
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B")]),
        fast_config(),
    );
    *generator.controller.lock() = Some(controller);

    let snapshot = runner.run().await;

    assert_eq!(snapshot.state, RunState::Aborted);
    assert!(snapshot.results.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn abort_before_first_task_sends_nothing() {
    let generator = ScriptedGenerator::new();
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A")]),
        fast_config(),
    );
    controller.abort();
    let snapshot = runner.run().await;

    assert_eq!(snapshot.state, RunState::Aborted);
    assert!(snapshot.results.is_empty());
    assert_eq!(generator.calls().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn resume_after_abort_is_a_no_op() {
    let generator = ScriptedGenerator::new();
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B")]),
        fast_config(),
    );
    let handle = runner.handle();
    controller.abort();
    let snapshot = runner.run().await;
    assert_eq!(snapshot.state, RunState::Aborted);
    let results_before = snapshot.results.len();

    controller.resume();
    controller.pause();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let after = handle.snapshot();
    assert_eq!(after.state, RunState::Aborted);
    assert_eq!(after.results.len(), results_before);
    assert_eq!(generator.calls().len(), 0);
}

#[tokio::test(start_paused = true)]
async fn results_order_matches_task_order() {
    let generator = ScriptedGenerator::new()
        .script("Hotel B", vec![Outcome::Fail("boom")])
        .script("Hotel C", vec![Outcome::RateLimited, Outcome::Ok]);
    let (runner, controller) = BatchRunner::new(
        generator.clone() as Arc<dyn ContentGenerator>,
        tasks(&[("CH", "Hotel A"), ("FR", "Hotel B"), ("DE", "Hotel C"), ("AT", "Hotel D")]),
        fast_config(),
    );
    let handle = runner.handle();
    let run = tokio::spawn(runner.run());

    wait_for_state(&handle, RunState::Paused).await;
    controller.resume();
    let snapshot = run.await.unwrap();

    assert_eq!(snapshot.state, RunState::Completed);
    let names: Vec<&str> = snapshot
        .results
        .iter()
        .map(|r| r.task.hotel_name.as_str())
        .collect();
    assert_eq!(names, vec!["Hotel A", "Hotel B", "Hotel C", "Hotel D"]);
    assert_eq!(snapshot.results[1].status, TaskStatus::Error);
    assert_eq!(snapshot.results[2].status, TaskStatus::Success);
}
