//! # Radtest Engine
//!
//! Sequence composition and execution for the radtest console. The engine
//! owns everything with real state-machine behavior:
//!
//! - **`plan`**: the ordered, mutable sequence of steps to execute
//! - **`history`**: the bounded most-recent-first buffer of step outcomes
//! - **`executor`**: the no-throw boundary to the remote execution service
//! - **`controller`**: the run state machine driving steps one at a time
//!
//! Frontends own the event receiver and render transcript text, history rows,
//! and the terminal summary; the engine has no notion of how any of it is
//! displayed.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use radtest_types::Session;

pub mod controller;
pub mod executor;
pub mod history;
pub mod plan;

pub use controller::{RunOutcome, STEP_DELAY, SequenceController, StartError};
pub use executor::{NoopExecutor, RemoteStepExecutor, StepExecutor};
pub use history::{ExecutionHistory, HISTORY_CAPACITY};
pub use plan::SequencePlan;

/// Load a session definition from a YAML file.
///
/// A session carries a name, the connection settings, and the ordered step
/// sequence to execute:
///
/// ```yaml
/// name: full-session-smoke
/// config:
///   server: 127.0.0.1
///   secret: testing123
///   vendor: mikrotik
///   username: alice
///   password: hunter2
/// sequence: [auth, start, alive, stop]
/// ```
pub fn parse_session_file(path: impl AsRef<Path>) -> Result<Session> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("failed to read session file: {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse session file: {}", path.display()))
}
