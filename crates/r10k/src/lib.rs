//! r10k deployment adapter.
//!
//! Implements the [`relay::Deployer`] trait by running the `r10k` command-line
//! tool:
//!
//! - full run: `r10k deploy environment -p --verbose info`
//! - single module: `r10k deploy module <name> --verbose info`
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning lives here. The [`relay`] crate sees
//! only [`relay::Deployer`].
//!
//! ## Outcome Visibility
//!
//! r10k gives no useful signal about whether a module was actually updated, so
//! the exit status is logged and otherwise ignored. The command inherits
//! stdout/stderr, which puts r10k's own output in the service journal. No
//! timeout is applied: a hung r10k blocks the consumer until it is restarted.
//!
//! Arguments are passed as an argv vector, never through a shell, and module
//! names are already restricted to `[A-Za-z0-9]*` by [`relay::ModuleName`].
//! An empty module name contributes no argument, leaving
//! `r10k deploy module --verbose info` for r10k to reject.

use std::process::Stdio;

use async_trait::async_trait;
use relay::{DeployError, Deployer, ModuleName};
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Runs r10k as a child process.
#[derive(Debug, Clone)]
pub struct R10kDeployer {
    program: String,
}

impl R10kDeployer {
    /// Creates a deployer that invokes `program` (a path or a name on `PATH`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for a full environment deployment.
    pub fn environment_args() -> Vec<String> {
        ["deploy", "environment", "-p", "--verbose", "info"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Arguments for a single-module deployment.
    pub fn module_args(module: &ModuleName) -> Vec<String> {
        let mut args = vec!["deploy".to_string(), "module".to_string()];
        if !module.is_empty() {
            args.push(module.as_str().to_string());
        }
        args.extend(["--verbose".to_string(), "info".to_string()]);
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<(), DeployError> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        info!(command = %command_line, "Running r10k");

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| DeployError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if status.success() {
            info!(command = %command_line, "r10k exited");
        } else {
            warn!(command = %command_line, code = ?status.code(), "r10k exited with failure status");
        }
        Ok(())
    }
}

impl Default for R10kDeployer {
    fn default() -> Self {
        Self::new("r10k")
    }
}

#[async_trait]
impl Deployer for R10kDeployer {
    #[instrument(skip(self))]
    async fn deploy_all(&self) -> Result<(), DeployError> {
        self.run(Self::environment_args()).await
    }

    #[instrument(skip(self), fields(module = %module))]
    async fn deploy_module(&self, module: &ModuleName) -> Result<(), DeployError> {
        self.run(Self::module_args(module)).await
    }
}
