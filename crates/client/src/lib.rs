//! HTTP client for the remote step execution service.
//!
//! The execution service owns everything protocol-shaped: it builds, sends,
//! and parses RADIUS packets, and reports back a structural result (success
//! flag plus a human-readable transcript). This crate only speaks JSON over
//! HTTP to it.
//!
//! The primary entry point is [`RadtestClient`]. Create one via
//! [`RadtestClient::from_env`] (honoring `RADTEST_ENDPOINT`) or
//! [`RadtestClient::new`] with an explicit base URL.
//!
//! All methods here return `Result` and may fail on transport problems; the
//! no-throw guarantee required by the sequence controller is layered on top by
//! the engine's executor boundary, not here.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use radtest_types::{ConnectionProbe, StepRequest, StepResult, Vendor};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Environment variable overriding the execution service base URL.
pub const ENDPOINT_ENV: &str = "RADTEST_ENDPOINT";

/// Default base URL of a locally running execution service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5001";

/// Default request timeout applied to every call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around a configured `reqwest::Client` for the execution
/// service API.
#[derive(Debug, Clone)]
pub struct RadtestClient {
    base_url: String,
    http: Client,
}

impl RadtestClient {
    /// Construct a client against an explicit base URL with the default
    /// request timeout.
    ///
    /// The URL must parse and use the `http` or `https` scheme; a trailing
    /// slash is stripped so paths can be appended verbatim.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Construct a client with an explicit request timeout. The timeout must
    /// outlast the service's own RADIUS timeout-and-retry budget, or slow
    /// exchanges will be misreported as transport failures.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Construct a client from `RADTEST_ENDPOINT`, falling back to the local
    /// default service address.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var(ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(base_url)
    }

    /// Base URL the client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building execution service request");
        self.http.request(method, url)
    }

    /// Execute a single protocol exchange step.
    ///
    /// POSTs the step payload to `/api/execute_step` and returns the service's
    /// structural result. The service reports protocol-level rejection inside
    /// the result (`success = false`); only transport problems surface as
    /// `Err` here.
    pub async fn execute_step(&self, request: &StepRequest) -> Result<StepResult> {
        let response = self
            .request(reqwest::Method::POST, "/api/execute_step")
            .json(request)
            .send()
            .await
            .context("execution service unreachable")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("execution service returned HTTP {}: {}", status.as_u16(), body.trim());
        }
        serde_json::from_str(&body).context("malformed execution service response")
    }

    /// Probe whether the execution service can reach the RADIUS server.
    pub async fn test_connection(&self, server: &str, secret: &str, vendor: Vendor) -> Result<ConnectionProbe> {
        let payload = serde_json::json!({
            "server": server,
            "secret": secret,
            "vendor": vendor,
        });
        let response = self
            .request(reqwest::Method::POST, "/api/test_connection")
            .json(&payload)
            .send()
            .await
            .context("execution service unreachable")?;

        // The service answers 400 with the same probe shape on failure.
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ConnectionProbe>(&body) {
            Ok(probe) => Ok(probe),
            Err(_) if !status.is_success() => {
                bail!("connection test failed with HTTP {}: {}", status.as_u16(), body.trim())
            }
            Err(error) => Err(error).context("malformed connection probe response"),
        }
    }

    /// Fetch the default attribute-value pairs the service applies for a
    /// vendor when no override is supplied.
    pub async fn vendor_defaults(&self, vendor: Vendor) -> Result<IndexMap<String, String>> {
        let path = format!("/api/get_defaults/{vendor}");
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .context("execution service unreachable")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("{}", service_error(status, &body));
        }

        let defaults: IndexMap<String, Value> = serde_json::from_str(&body).context("malformed vendor defaults response")?;
        Ok(defaults.into_iter().map(|(key, value)| (key, scalar_to_string(value))).collect())
    }

    /// Render a packet preview for one step without sending it.
    pub async fn preview_packet(&self, request: &StepRequest) -> Result<String> {
        #[derive(Deserialize)]
        struct PreviewResponse {
            packet_details: String,
        }

        let response = self
            .request(reqwest::Method::POST, "/api/preview_packet")
            .json(request)
            .send()
            .await
            .context("execution service unreachable")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("{}", service_error(status, &body));
        }
        let preview: PreviewResponse = serde_json::from_str(&body).context("malformed packet preview response")?;
        Ok(preview.packet_details)
    }
}

/// Validate that a base URL is acceptable: it must parse and use a plain
/// HTTP scheme. The service address is user-supplied lab infrastructure, so
/// no host allowlist is applied.
fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = url::Url::parse(base_url).with_context(|| format!("invalid endpoint URL '{base_url}'"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("endpoint URL must use http or https, got '{other}'"),
    }
}

/// Extract the service's `{"error": ...}` detail when present, otherwise fall
/// back to the raw body.
fn service_error(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: String,
    }

    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => format!("execution service returned HTTP {}: {}", status.as_u16(), body.trim()),
    }
}

/// Vendor defaults arrive as arbitrary JSON scalars; render them the way the
/// console displays AVP values.
fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_endpoints() {
        assert!(validate_base_url("http://127.0.0.1:5001").is_ok());
        assert!(validate_base_url("https://radius-lab.example.com").is_ok());
    }

    #[test]
    fn rejects_non_http_schemes_and_garbage() {
        assert!(validate_base_url("ftp://127.0.0.1").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let client = RadtestClient::new("http://127.0.0.1:5001/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5001");
    }

    #[test]
    fn from_env_honors_override() {
        temp_env::with_var(ENDPOINT_ENV, Some("http://10.0.0.7:8080"), || {
            let client = RadtestClient::from_env().unwrap();
            assert_eq!(client.base_url(), "http://10.0.0.7:8080");
        });
    }

    #[test]
    fn service_error_prefers_structured_detail() {
        let detail = service_error(StatusCode::NOT_FOUND, r#"{"error": "Unknown RADIUS vendor 'juniper'"}"#);
        assert_eq!(detail, "Unknown RADIUS vendor 'juniper'");
        let fallback = service_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(fallback.contains("HTTP 500"));
    }

    #[test]
    fn scalar_rendering_matches_console_display() {
        assert_eq!(scalar_to_string(Value::String("Virtual".into())), "Virtual");
        assert_eq!(scalar_to_string(serde_json::json!(50331950)), "50331950");
    }
}
