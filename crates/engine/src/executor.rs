//! The executor boundary: dispatch one step, always come back with a result.

use async_trait::async_trait;
use radtest_client::RadtestClient;
use radtest_types::{StepRequest, StepResult};
use tracing::{debug, warn};

/// Executes a single protocol exchange step against the remote service.
///
/// Implementations must not fail out of `execute`: transport problems
/// (unreachable endpoint, timeout, malformed response) are folded into a
/// `StepResult` with `success = false` and a transcript line describing the
/// error. The controller's run loop depends on this contract — it has no
/// recovery path around the call.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, request: &StepRequest) -> StepResult;
}

/// Executor backed by the HTTP execution service.
pub struct RemoteStepExecutor {
    client: RadtestClient,
}

impl RemoteStepExecutor {
    pub fn new(client: RadtestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StepExecutor for RemoteStepExecutor {
    async fn execute(&self, request: &StepRequest) -> StepResult {
        debug!(command = %request.command, server = %request.server, "dispatching step");
        match self.client.execute_step(request).await {
            Ok(result) => result,
            Err(error) => {
                warn!(command = %request.command, %error, "step dispatch failed at the transport layer");
                StepResult::network_failure(format!("{error:#}"))
            }
        }
    }
}

/// Echoes the request without network side effects. Used by tests and
/// `--dry-run` previews.
#[derive(Debug, Default)]
pub struct NoopExecutor;

#[async_trait]
impl StepExecutor for NoopExecutor {
    async fn execute(&self, request: &StepRequest) -> StepResult {
        StepResult {
            success: true,
            log: format!(
                "{} request for '{}' to {} skipped (dry run)\n",
                request.command.to_string().to_uppercase(),
                request.username,
                request.server
            ),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use radtest_types::{ConnectionParams, StepKind, Vendor};

    fn request() -> StepRequest {
        let params = ConnectionParams {
            server: "127.0.0.1".into(),
            secret: "testing123".into(),
            vendor: Vendor::Cisco,
            username: "bob".into(),
            password: "pw".into(),
            avps: IndexMap::new(),
        };
        StepRequest::new(&params, StepKind::Auth)
    }

    #[tokio::test]
    async fn noop_executor_reports_success_with_a_transcript() {
        let result = NoopExecutor.execute(&request()).await;
        assert!(result.success);
        assert!(result.log.contains("AUTH"));
        assert!(result.log.ends_with('\n'));
    }
}
