//! Run lifecycle state, live events, and execution history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::step::StepKind;

/// Lifecycle of the single allowed run.
///
/// Transitions only through the controller's state machine:
/// `Idle → Running → Idle` normally, with `StopRequested` interposed when a
/// cancellation is requested mid-run. Every exit path of the run loop lands
/// back on `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    StopRequested,
}

/// Outcome record for one executed step, retained in the bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub command: StepKind,
    pub success: bool,
    /// Wall-clock completion time.
    pub completed_at: DateTime<Utc>,
    /// Measured dispatch-to-result duration. Absent for entries imported from
    /// sources that did not record timing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Aggregate numbers emitted when a run finishes without user cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps actually dispatched before the loop exited.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of the measured per-step durations.
    pub total_ms: u64,
    /// `total_ms` divided by the number of planned steps, not attempted ones.
    /// An early abort therefore shows a larger apparent average.
    pub avg_ms_per_step: f64,
}

/// Lifecycle events emitted by the sequence controller while a run is in
/// flight. The frontend owns the receiving end and renders transcript text,
/// history rows, and the terminal summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
    RunStarted {
        at: DateTime<Utc>,
    },
    /// One newline-terminated chunk of live transcript.
    Transcript {
        text: String,
    },
    StepStarted {
        index: usize,
        command: StepKind,
    },
    StepFinished {
        index: usize,
        command: StepKind,
        success: bool,
        duration_ms: u64,
    },
    HistoryRecorded {
        entry: HistoryEntry,
    },
    /// The run was halted by an explicit stop request; no summary follows.
    RunHalted,
    RunCompleted {
        summary: RunSummary,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_state_defaults_to_idle() {
        assert_eq!(RunState::default(), RunState::Idle);
    }

    #[test]
    fn history_entry_omits_absent_duration() {
        let entry = HistoryEntry {
            command: StepKind::Auth,
            success: true,
            completed_at: Utc::now(),
            duration_ms: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("duration_ms").is_none());
    }
}
