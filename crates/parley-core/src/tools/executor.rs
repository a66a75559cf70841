//! Tool executor -- dispatches the reasoning step's tool calls.
//!
//! Arguments are validated before execution; a mismatch becomes an error
//! outcome folded into the next reasoning pass, never a pipeline failure.
//! Independent calls run concurrently under a bounded ceiling, and results
//! are returned in request order regardless of completion order. A call
//! that exceeds its timeout is marked as a timeout outcome and not retried
//! here -- retry policy belongs to the tool implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use parley_types::tool::{ToolCallRequest, ToolOutcome, ToolResult};

use super::catalogue::ToolCatalogue;
use super::validate::validate_arguments;

/// Executes one dispatch round's tool calls.
pub struct ToolExecutor {
    catalogue: Arc<ToolCatalogue>,
    concurrency: usize,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(catalogue: Arc<ToolCatalogue>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            catalogue,
            // A ceiling of zero would deadlock the semaphore.
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Execute an ordered list of tool calls.
    ///
    /// The result vector matches the request order index-for-index.
    pub async fn execute(&self, calls: Vec<ToolCallRequest>) -> Vec<ToolResult> {
        info!(count = calls.len(), "Dispatching tool calls");

        let mut slots: Vec<Option<ToolResult>> = (0..calls.len()).map(|_| None).collect();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set: JoinSet<(usize, ToolOutcome)> = JoinSet::new();

        for (index, call) in calls.into_iter().enumerate() {
            let Some(tool) = self.catalogue.get(&call.tool_name) else {
                warn!(tool = %call.tool_name, "Unknown tool requested");
                slots[index] = Some(ToolResult {
                    outcome: ToolOutcome::Error {
                        message: format!("unknown tool '{}'", call.tool_name),
                    },
                    request: call,
                });
                continue;
            };

            if let Err(violation) = validate_arguments(&tool.spec().input_schema, &call.arguments)
            {
                warn!(tool = %call.tool_name, %violation, "Tool arguments rejected");
                slots[index] = Some(ToolResult {
                    outcome: ToolOutcome::Error { message: violation },
                    request: call,
                });
                continue;
            }

            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;
            let arguments = call.arguments.clone();
            let name = call.tool_name.clone();
            slots[index] = Some(ToolResult {
                request: call,
                // Placeholder; overwritten when the task completes.
                outcome: ToolOutcome::Error {
                    message: "task did not complete".to_string(),
                },
            });

            set.spawn(async move {
                // The semaphore is never closed, so acquisition only fails
                // if the executor itself is torn down mid-round.
                let _permit = semaphore.acquire_owned().await;
                let outcome = match tokio::time::timeout(timeout, tool.invoke(arguments)).await {
                    Ok(Ok(payload)) => ToolOutcome::Success { payload },
                    Ok(Err(err)) => {
                        warn!(tool = %name, error = %err, "Tool execution failed");
                        ToolOutcome::Error {
                            message: err.to_string(),
                        }
                    }
                    Err(_) => {
                        warn!(tool = %name, timeout_ms = timeout.as_millis() as u64, "Tool timed out");
                        ToolOutcome::Timeout
                    }
                };
                (index, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots[index].as_mut() {
                        slot.outcome = outcome;
                    }
                }
                Err(err) => warn!(error = %err, "Tool task aborted"),
            }
        }

        let results: Vec<ToolResult> = slots.into_iter().flatten().collect();
        let successful = results.iter().filter(|r| r.outcome.is_success()).count();
        debug!(
            successful,
            failed = results.len() - successful,
            "Tool dispatch round complete"
        );
        results
    }
}
