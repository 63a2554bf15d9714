//! Queue dispatch loop.
//!
//! Sequential receive → decode → route → deploy → acknowledge, one message at
//! a time. There is no worker pool: while r10k runs, the loop is blocked, and
//! the queue's visibility timeout keeps other hosts' consumers away from the
//! same delivery.
//!
//! # Acknowledgement
//!
//! | Outcome | Deleted from queue? |
//! |---------|---------------------|
//! | environment or module deployment attempted | yes |
//! | module name rejected | yes (redelivery cannot make it valid) |
//! | body could not be decoded | no (redelivered after the visibility timeout) |
//!
//! A deployment tool that fails to launch is logged, and the message is still
//! acknowledged: outcomes of the tool are not tracked.
//!
//! # Failure Isolation
//!
//! Every error is logged at the cycle that produced it and the loop carries
//! on. The loop only ends when its [`CancellationToken`] is cancelled (or a
//! test-imposed cycle limit is reached).

use std::sync::Arc;
use std::time::Duration;

use relay::{plan_deployment, DeployPlan, Deployer, MessageQueue, ModuleName, PushEvent, QueueMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Pause after a failed receive before polling again.
const DEFAULT_RECEIVE_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// What happened to one received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A full environment deployment was started.
    DeployedEnvironment,
    /// A single-module deployment was started.
    DeployedModule(ModuleName),
    /// The inferred module name was unsafe; nothing was run.
    Rejected {
        /// The candidate that failed validation.
        candidate: String,
    },
    /// The body was not a push event notification; left on the queue.
    Undecodable,
}

impl DispatchOutcome {
    /// Whether the message should be deleted from the queue.
    pub fn acknowledges(&self) -> bool {
        !matches!(self, DispatchOutcome::Undecodable)
    }
}

/// Drives the dispatch loop over a queue and a deployer.
pub struct Consumer {
    queue: Arc<dyn MessageQueue>,
    deployer: Arc<dyn Deployer>,
    receive_error_pause: Duration,
}

impl Consumer {
    /// Creates a consumer reading from `queue` and deploying through `deployer`.
    pub fn new(queue: Arc<dyn MessageQueue>, deployer: Arc<dyn Deployer>) -> Self {
        Self {
            queue,
            deployer,
            receive_error_pause: DEFAULT_RECEIVE_ERROR_PAUSE,
        }
    }

    /// Overrides the pause taken after a failed receive.
    pub fn with_receive_error_pause(mut self, pause: Duration) -> Self {
        self.receive_error_pause = pause;
        self
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// Cancellation interrupts a pending long-poll but never an in-flight
    /// deployment: the current message is finished and acknowledged first.
    pub async fn run(&self, shutdown: CancellationToken) {
        self.run_cycles(shutdown, None).await;
    }

    /// Runs at most `max_cycles` poll cycles (or until cancelled) and returns
    /// the number of cycles completed.
    pub async fn run_for(&self, shutdown: CancellationToken, max_cycles: usize) -> usize {
        self.run_cycles(shutdown, Some(max_cycles)).await
    }

    async fn run_cycles(&self, shutdown: CancellationToken, max_cycles: Option<usize>) -> usize {
        info!("Consumer loop started");
        let mut cycles = 0;

        loop {
            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            debug!("Checking for new message (long-poll)");
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping consumer");
                    break;
                }
                received = self.queue.receive() => received,
            };
            cycles += 1;

            match received {
                Ok(Some(message)) => {
                    self.process(&message).await;
                }
                Ok(None) => debug!("No new message"),
                Err(e) => {
                    error!(error = %e, "Failed to receive from queue");
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => {
                            info!("Shutdown signal received, stopping consumer");
                            break;
                        }
                        _ = tokio::time::sleep(self.receive_error_pause) => {}
                    }
                }
            }
        }

        info!(cycles, "Consumer loop stopped");
        cycles
    }

    /// Processes one message: decode, route, deploy, and acknowledge.
    #[instrument(skip(self, message), fields(message_id = %message.id))]
    pub async fn process(&self, message: &QueueMessage) -> DispatchOutcome {
        info!("Received message");

        let outcome = match PushEvent::from_notification(&message.body) {
            Ok(event) => self.dispatch(&event).await,
            Err(e) => {
                warn!(error = %e, "Unable to decode message; leaving it for redelivery");
                DispatchOutcome::Undecodable
            }
        };

        if outcome.acknowledges() {
            match self.queue.acknowledge(&message.receipt_handle).await {
                Ok(()) => debug!("Message acknowledged"),
                Err(e) => error!(error = %e, "Failed to acknowledge message"),
            }
        }

        outcome
    }

    /// Routes a decoded event and runs the selected deployment.
    #[instrument(skip(self, event), fields(repo = %event.repo_name, user = %event.user))]
    async fn dispatch(&self, event: &PushEvent) -> DispatchOutcome {
        match plan_deployment(&event.repo_name) {
            DeployPlan::Environment => {
                info!("Performing full r10k run for environment update");
                if let Err(e) = self.deployer.deploy_all().await {
                    error!(error = %e, "Environment deployment could not be started");
                }
                DispatchOutcome::DeployedEnvironment
            }
            DeployPlan::Module(module) => {
                info!(module = %module, "Performing single module r10k run");
                if let Err(e) = self.deployer.deploy_module(&module).await {
                    error!(module = %module, error = %e, "Module deployment could not be started");
                }
                DispatchOutcome::DeployedModule(module)
            }
            DeployPlan::Rejected { candidate } => {
                warn!(candidate = %candidate, "Invalid module name, unable to process");
                DispatchOutcome::Rejected { candidate }
            }
        }
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
