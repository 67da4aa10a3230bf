//! Connection settings, per-step wire payloads, and executor results.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::step::StepKind;

/// NAS vendor profile implemented by the execution service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Mikrotik,
    Cisco,
    Fortigate,
}

impl Vendor {
    /// Every supported vendor.
    pub const ALL: [Vendor; 3] = [Vendor::Mikrotik, Vendor::Cisco, Vendor::Fortigate];

    /// Canonical lowercase identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Mikrotik => "mikrotik",
            Vendor::Cisco => "cisco",
            Vendor::Fortigate => "fortigate",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vendor {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "mikrotik" => Ok(Vendor::Mikrotik),
            "cisco" => Ok(Vendor::Cisco),
            "fortigate" => Ok(Vendor::Fortigate),
            other => bail!("unknown vendor '{other}'; expected one of: mikrotik, cisco, fortigate"),
        }
    }
}

/// Connection settings for one run.
///
/// The controller snapshots these once at run start; the snapshot is a full
/// clone, including the attribute overrides, so later mutation by the caller
/// cannot leak into a run already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// RADIUS server address the execution service should target.
    pub server: String,
    /// Shared secret between the simulated NAS and the server.
    pub secret: String,
    pub vendor: Vendor,
    pub username: String,
    pub password: String,
    /// Attribute-value pair overrides forwarded verbatim to the execution
    /// service. Keys are unique and keep their insertion order.
    #[serde(default)]
    pub avps: IndexMap<String, String>,
}

/// Wire payload for a single step dispatch.
///
/// Field names and order match the execution service's `/api/execute_step`
/// request body. Built once per step from the run snapshot; immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    pub username: String,
    pub password: String,
    pub vendor: Vendor,
    pub command: StepKind,
    pub server: String,
    pub secret: String,
    #[serde(default)]
    pub avps: IndexMap<String, String>,
}

impl StepRequest {
    /// Build the payload for `command` from a snapshot of connection settings.
    pub fn new(params: &ConnectionParams, command: StepKind) -> Self {
        Self {
            username: params.username.clone(),
            password: params.password.clone(),
            vendor: params.vendor,
            command,
            server: params.server.clone(),
            secret: params.secret.clone(),
            avps: params.avps.clone(),
        }
    }
}

/// Structural outcome of one executed step, as reported by the execution
/// service (or synthesized locally on transport failure).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    /// Human-readable transcript excerpt produced by the execution service.
    pub log: String,
    /// Transport-level detail when the result was synthesized locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    /// Synthesize the result for a transport-level failure. The executor
    /// boundary never raises; unreachable endpoints, timeouts, and malformed
    /// responses all land here.
    pub fn network_failure(detail: impl fmt::Display) -> Self {
        let detail = detail.to_string();
        Self {
            success: false,
            log: format!("Network error: {detail}\n"),
            error: Some(detail),
        }
    }
}

/// Reachability probe result from `/api/test_connection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProbe {
    pub success: bool,
    pub message: String,
    #[serde(default, rename = "response_time", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
}

/// A named, reloadable test session: connection settings plus the ordered
/// sequence to execute. Stored as YAML files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub config: ConnectionParams,
    pub sequence: Vec<StepKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> ConnectionParams {
        ConnectionParams {
            server: "127.0.0.1".into(),
            secret: "testing123".into(),
            vendor: Vendor::Mikrotik,
            username: "alice".into(),
            password: "hunter2".into(),
            avps: IndexMap::from([("NAS-Identifier".to_string(), "lab-nas".to_string())]),
        }
    }

    #[test]
    fn step_request_matches_wire_shape() {
        let request = StepRequest::new(&params(), StepKind::Auth);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "username": "alice",
                "password": "hunter2",
                "vendor": "mikrotik",
                "command": "auth",
                "server": "127.0.0.1",
                "secret": "testing123",
                "avps": {"NAS-Identifier": "lab-nas"},
            })
        );
    }

    #[test]
    fn step_request_snapshots_the_avp_map() {
        let mut source = params();
        let request = StepRequest::new(&source, StepKind::Start);
        source.avps.insert("NAS-Port".into(), "15".into());
        assert_eq!(request.avps.len(), 1);
    }

    #[test]
    fn network_failure_is_a_failed_result_with_transcript() {
        let result = StepResult::network_failure("connection refused");
        assert!(!result.success);
        assert_eq!(result.log, "Network error: connection refused\n");
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn step_result_parses_service_response() {
        let result: StepResult = serde_json::from_str(r#"{"success": true, "log": "Sending AUTH...\n"}"#).unwrap();
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn session_round_trips_through_yaml() {
        let session = Session {
            name: "smoke".into(),
            config: params(),
            sequence: vec![StepKind::Auth, StepKind::Start, StepKind::Stop],
        };
        let text = serde_yaml::to_string(&session).unwrap();
        let parsed: Session = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn connection_probe_reads_service_field_name() {
        let probe: ConnectionProbe =
            serde_json::from_str(r#"{"success": true, "message": "ok", "response_time": 12.5}"#).unwrap();
        assert_eq!(probe.response_time_ms, Some(12.5));
    }
}
