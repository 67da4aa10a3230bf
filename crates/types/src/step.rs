//! Step identifiers and their registry of display metadata.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// One unit of protocol exchange in a sequence.
///
/// The set is closed: every kind maps to exactly one request shape on the
/// execution service side (an Access-Request for [`StepKind::Auth`], an
/// Accounting-Request for the rest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Access-Request / Access-Accept exchange.
    Auth,
    /// Accounting-Request with `Acct-Status-Type = Start`.
    Start,
    /// Accounting-Request with `Acct-Status-Type = Alive` (interim update).
    Alive,
    /// Accounting-Request with `Acct-Status-Type = Stop`.
    Stop,
}

/// Display metadata attached to a step kind, used by console frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMeta {
    /// Human-readable label.
    pub label: &'static str,
    /// Short glyph shown next to the label in sequence listings.
    pub glyph: &'static str,
}

impl StepKind {
    /// Every step kind, in the order a full session uses them.
    pub const ALL: [StepKind; 4] = [StepKind::Auth, StepKind::Start, StepKind::Alive, StepKind::Stop];

    /// Canonical lowercase identifier used on the wire and in session files.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Auth => "auth",
            StepKind::Start => "start",
            StepKind::Alive => "alive",
            StepKind::Stop => "stop",
        }
    }

    /// Registry lookup for display metadata.
    pub fn meta(&self) -> StepMeta {
        match self {
            StepKind::Auth => StepMeta {
                label: "Authenticate",
                glyph: "🔑",
            },
            StepKind::Start => StepMeta {
                label: "Start Accounting",
                glyph: "▶",
            },
            StepKind::Alive => StepMeta {
                label: "Interim Update",
                glyph: "↻",
            },
            StepKind::Stop => StepMeta {
                label: "Stop Accounting",
                glyph: "⏹",
            },
        }
    }

    /// `Acct-Status-Type` value carried by accounting steps; `None` for
    /// authentication.
    pub fn acct_status_type(&self) -> Option<&'static str> {
        match self {
            StepKind::Auth => None,
            StepKind::Start => Some("Start"),
            StepKind::Alive => Some("Alive"),
            StepKind::Stop => Some("Stop"),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(StepKind::Auth),
            "start" => Ok(StepKind::Start),
            "alive" => Ok(StepKind::Alive),
            "stop" => Ok(StepKind::Stop),
            other => bail!("unknown step kind '{other}'; expected one of: auth, start, alive, stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for kind in StepKind::ALL {
            let parsed: StepKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn from_str_is_case_insensitive_and_trimmed() {
        assert_eq!(" AUTH ".parse::<StepKind>().unwrap(), StepKind::Auth);
        assert!("reboot".parse::<StepKind>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_identifiers() {
        assert_eq!(serde_json::to_string(&StepKind::Alive).unwrap(), "\"alive\"");
        let parsed: StepKind = serde_json::from_str("\"stop\"").unwrap();
        assert_eq!(parsed, StepKind::Stop);
    }

    #[test]
    fn accounting_steps_carry_status_type() {
        assert_eq!(StepKind::Auth.acct_status_type(), None);
        assert_eq!(StepKind::Start.acct_status_type(), Some("Start"));
        assert_eq!(StepKind::Alive.acct_status_type(), Some("Alive"));
        assert_eq!(StepKind::Stop.acct_status_type(), Some("Stop"));
    }

    #[test]
    fn registry_labels_are_distinct() {
        let labels: Vec<_> = StepKind::ALL.iter().map(|kind| kind.meta().label).collect();
        for (index, label) in labels.iter().enumerate() {
            assert!(!labels[index + 1..].contains(label));
        }
    }
}
