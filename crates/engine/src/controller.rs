//! The sequence execution state machine.
//!
//! Drives a plan against the executor one step at a time, emitting lifecycle
//! events over a Tokio channel. The caller owns the event receiver; stop
//! requests come back in through [`SequenceController::request_stop`] (or by
//! invoking [`SequenceController::run`] again while a run is active).
//!
//! Scheduling is single-run cooperative: the only suspension points are the
//! executor call and the fixed inter-step delay, so no two steps are ever in
//! flight at once and a later step is never dispatched before the earlier
//! one's outcome has been recorded.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use radtest_types::{ConnectionParams, HistoryEntry, RunEvent, RunState, RunSummary, StepRequest};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::executor::StepExecutor;
use crate::history::ExecutionHistory;
use crate::plan::SequencePlan;

/// Fixed pause between consecutive steps. Throttles request rate and gives
/// the server time to settle session state between related exchanges.
pub const STEP_DELAY: Duration = Duration::from_millis(500);

/// Reasons a run refuses to start. Checked before any state change; a failed
/// precondition leaves the controller exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("the sequence plan is empty")]
    EmptyPlan,
    #[error("server address must not be blank")]
    MissingServer,
    #[error("shared secret must not be blank")]
    MissingSecret,
}

/// What a call to [`SequenceController::run`] turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The loop ran to its natural end: the whole plan, or a fail-fast abort.
    /// Either way a summary was emitted.
    Completed(RunSummary),
    /// The loop exited because a stop was requested mid-run. No summary.
    Halted,
    /// A run was already active, so the call was treated as a stop request.
    StopRequested,
}

/// Orchestrates sequential execution of a [`SequencePlan`].
pub struct SequenceController {
    executor: Arc<dyn StepExecutor>,
    state: Mutex<RunState>,
    history: Mutex<ExecutionHistory>,
    step_delay: Duration,
}

impl SequenceController {
    pub fn new(executor: Arc<dyn StepExecutor>) -> Self {
        Self {
            executor,
            state: Mutex::new(RunState::Idle),
            history: Mutex::new(ExecutionHistory::new()),
            step_delay: STEP_DELAY,
        }
    }

    /// Override the inter-step delay. Tests inject `Duration::ZERO` to keep
    /// the suite fast.
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.state.lock().expect("run state lock poisoned")
    }

    /// Cloned snapshot of the execution history, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().expect("history lock poisoned").snapshot()
    }

    pub fn clear_history(&self) {
        self.history.lock().expect("history lock poisoned").clear();
    }

    /// Request cancellation of the active run. Returns `true` when a run was
    /// active. Cooperative: an in-flight executor call finishes naturally and
    /// the loop exits at the next iteration boundary.
    pub fn request_stop(&self) -> bool {
        let mut state = self.state.lock().expect("run state lock poisoned");
        match *state {
            RunState::Running => {
                *state = RunState::StopRequested;
                true
            }
            RunState::StopRequested => true,
            RunState::Idle => false,
        }
    }

    /// Execute `plan` against the executor, emitting [`RunEvent`]s on
    /// `events` as the run progresses.
    ///
    /// Invoking this while a run is active never starts a second run; the
    /// call becomes a stop request and returns [`RunOutcome::StopRequested`]
    /// immediately. Precondition failures return a distinct [`StartError`]
    /// with no state change and nothing emitted.
    pub async fn run(
        &self,
        plan: &SequencePlan,
        params: &ConnectionParams,
        events: &UnboundedSender<RunEvent>,
    ) -> Result<RunOutcome, StartError> {
        {
            let mut state = self.state.lock().expect("run state lock poisoned");
            match *state {
                RunState::Running => {
                    *state = RunState::StopRequested;
                    return Ok(RunOutcome::StopRequested);
                }
                RunState::StopRequested => return Ok(RunOutcome::StopRequested),
                RunState::Idle => {
                    if plan.is_empty() {
                        return Err(StartError::EmptyPlan);
                    }
                    if params.server.trim().is_empty() {
                        return Err(StartError::MissingServer);
                    }
                    if params.secret.trim().is_empty() {
                        return Err(StartError::MissingSecret);
                    }
                    *state = RunState::Running;
                }
            }
        }

        let outcome = self.drive(plan, params, events).await;

        // Guaranteed finalizer: every exit path of the loop lands back on
        // Idle with the stop flag cleared.
        *self.state.lock().expect("run state lock poisoned") = RunState::Idle;
        Ok(outcome)
    }

    fn stop_requested(&self) -> bool {
        matches!(self.state(), RunState::StopRequested)
    }

    fn emit(&self, events: &UnboundedSender<RunEvent>, event: RunEvent) {
        let _ = events.send(event);
    }

    /// Emit one chunk of live transcript, newline-terminated.
    fn emit_text(&self, events: &UnboundedSender<RunEvent>, text: impl Into<String>) {
        let mut text = text.into();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.emit(events, RunEvent::Transcript { text });
    }

    async fn drive(
        &self,
        plan: &SequencePlan,
        params: &ConnectionParams,
        events: &UnboundedSender<RunEvent>,
    ) -> RunOutcome {
        // Snapshot once; the clone owns the AVP map, so mutating the source
        // mid-run cannot leak into this run.
        let snapshot = params.clone();
        let started_at = Utc::now();

        self.emit(events, RunEvent::RunStarted { at: started_at });
        self.emit_text(
            events,
            format!("Run started at {}", started_at.format("%Y-%m-%d %H:%M:%S UTC")),
        );
        self.emit_text(
            events,
            format!(
                "Server: {}  Vendor: {}  User: {}",
                snapshot.server, snapshot.vendor, snapshot.username
            ),
        );

        let total = plan.len();
        let mut attempted = 0usize;
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut total_ms = 0u64;
        let mut halted = false;

        for (index, &command) in plan.steps().iter().enumerate() {
            // Cancellation is observed only at the iteration boundary; a step
            // already in flight always runs to completion.
            if self.stop_requested() {
                halted = true;
                break;
            }

            let request = StepRequest::new(&snapshot, command);
            self.emit(events, RunEvent::StepStarted { index, command });
            self.emit_text(
                events,
                format!("[{}/{}] {} ({})", index + 1, total, command.meta().label, command),
            );

            let dispatch_started = Instant::now();
            let result = self.executor.execute(&request).await;
            let duration_ms = dispatch_started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
            debug!(%command, index, duration_ms, success = result.success, "step finished");

            attempted += 1;
            total_ms = total_ms.saturating_add(duration_ms);
            self.emit_text(events, result.log.clone());

            let entry = HistoryEntry {
                command,
                success: result.success,
                completed_at: Utc::now(),
                duration_ms: Some(duration_ms),
            };
            self.history.lock().expect("history lock poisoned").record(entry.clone());
            self.emit(events, RunEvent::HistoryRecorded { entry });
            self.emit(
                events,
                RunEvent::StepFinished {
                    index,
                    command,
                    success: result.success,
                    duration_ms,
                },
            );

            if result.success {
                succeeded += 1;
                self.emit_text(events, format!("OK ({duration_ms} ms)"));
            } else {
                failed += 1;
                self.emit_text(events, format!("FAILED ({duration_ms} ms)"));
                if index + 1 < total {
                    // Fail-fast: a single failure aborts the remainder.
                    self.emit_text(events, "Step failed; aborting remaining steps");
                    break;
                }
            }

            if index + 1 < total {
                tokio::time::sleep(self.step_delay).await;
            }
        }

        if halted {
            self.emit_text(events, "Execution halted by user");
            self.emit(events, RunEvent::RunHalted);
            return RunOutcome::Halted;
        }

        let summary = RunSummary {
            attempted,
            succeeded,
            failed,
            total_ms,
            // Averaged over the planned steps, not the attempted ones: an
            // early abort shows a larger apparent average.
            avg_ms_per_step: total_ms as f64 / total as f64,
        };
        self.emit_text(
            events,
            format!(
                "Summary: {} steps attempted, {} succeeded, {} failed",
                summary.attempted, summary.succeeded, summary.failed
            ),
        );
        self.emit_text(
            events,
            format!(
                "Total time: {} ms, average per step: {:.1} ms",
                summary.total_ms, summary.avg_ms_per_step
            ),
        );
        self.emit(events, RunEvent::RunCompleted { summary });
        RunOutcome::Completed(summary)
    }
}
