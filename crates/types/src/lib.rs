//! Shared type definitions for the radtest workspace.
//!
//! Everything that crosses a crate boundary lives here: step identifiers and
//! their display metadata, connection settings, the wire types exchanged with
//! the remote execution service, and the run lifecycle types emitted by the
//! sequence controller.

pub mod run;
pub mod session;
pub mod step;

pub use run::{HistoryEntry, RunEvent, RunState, RunSummary};
pub use session::{ConnectionParams, ConnectionProbe, Session, StepRequest, StepResult, Vendor};
pub use step::{StepKind, StepMeta};
