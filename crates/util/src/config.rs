//! Application configuration resolved from the environment.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Execution service base URL override.
pub const ENDPOINT_ENV: &str = "RADTEST_ENDPOINT";
/// Request timeout override, in whole seconds.
pub const TIMEOUT_ENV: &str = "RADTEST_TIMEOUT_SECS";
/// Inter-step delay override, in milliseconds.
pub const STEP_DELAY_ENV: &str = "RADTEST_STEP_DELAY_MS";

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5001";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Global settings for one console invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the execution service.
    pub endpoint: String,
    /// Timeout applied to each execution service request. Must outlast the
    /// service's own RADIUS timeout-and-retry budget.
    pub timeout: Duration,
    /// Cooperative pause between consecutive steps.
    pub step_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            step_delay: DEFAULT_STEP_DELAY,
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from environment variables, falling back to
    /// defaults. Unparseable numeric values are warned about and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = env::var(ENDPOINT_ENV)
            && !endpoint.trim().is_empty()
        {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(secs) = parse_env_number(TIMEOUT_ENV) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_env_number(STEP_DELAY_ENV) {
            config.step_delay = Duration::from_millis(millis);
        }

        config
    }
}

fn parse_env_number(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {name}={raw}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_local_service() {
        let config = AppConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:5001");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.step_delay, Duration::from_millis(500));
    }

    #[test]
    fn environment_overrides_apply() {
        temp_env::with_vars(
            [
                (ENDPOINT_ENV, Some("http://10.1.2.3:9000")),
                (TIMEOUT_ENV, Some("3")),
                (STEP_DELAY_ENV, Some("0")),
            ],
            || {
                let config = AppConfig::from_env();
                assert_eq!(config.endpoint, "http://10.1.2.3:9000");
                assert_eq!(config.timeout, Duration::from_secs(3));
                assert_eq!(config.step_delay, Duration::ZERO);
            },
        );
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        temp_env::with_var(STEP_DELAY_ENV, Some("soon"), || {
            let config = AppConfig::from_env();
            assert_eq!(config.step_delay, Duration::from_millis(500));
        });
    }
}
