//! r10k relay entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration**: `.env` (if present), then the process
//!    environment, resolved into a [`relay::RelayConfig`].
//! 2. **Wire observability**: one `tracing` subscriber with a text or JSON
//!    fmt layer and an optional OpenTelemetry OTLP exporter (see
//!    [`telemetry`]).
//! 3. **Construct infrastructure**: the SNS publisher, the SQS queue, and the
//!    r10k deployer, injected into the [`listener`] components.
//! 4. **Select the mode**:
//!    - `webhook`: serve the GitHub webhook receiver, either on a TCP socket
//!      or under the AWS Lambda HTTP runtime (`--lambda`);
//!    - `consume`: provision the queue subscription, then run the dispatch
//!      loop until SIGINT or SIGTERM.

mod shutdown;
mod telemetry;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use aws::SnsPublisher;
use clap::{Parser, Subcommand};
use listener::Consumer;
use r10k::R10kDeployer;
use relay::RelayConfig;
use tracing::{error, info};

use crate::telemetry::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "r10k-relay", version, about = "Relays GitHub pushes to r10k on every Puppet master")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Receive GitHub webhooks and publish push events to the topic.
    Webhook {
        /// Listen address; overrides WEBHOOK_BIND.
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Run under the AWS Lambda HTTP runtime instead of a TCP listener.
        #[arg(long, conflicts_with = "bind")]
        lambda: bool,
    },
    /// Subscribe this host's queue to the topic and deploy every push.
    Consume,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is normal outside development.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.log_format) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "r10k-relay exited with an error");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(command: Command) -> anyhow::Result<()> {
    let hostname = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_default();
    // The queue is resolved lazily: only `consume` needs it.
    let config = RelayConfig::from_env(&hostname).context("invalid configuration")?;
    info!(
        topic = %config.topic,
        queue = config.queue.as_ref().map_or("<unset>", |queue| queue.as_str()),
        region = %config.region,
        r10k_bin = %config.r10k_bin,
        "Configuration loaded"
    );

    let sdk_config = aws::load_sdk_config(&config.region).await;

    match command {
        Command::Webhook { bind, lambda } => {
            let publisher = Arc::new(SnsPublisher::new(&sdk_config, config.topic.clone()));
            let app = listener::router(publisher);

            if lambda {
                info!("Serving webhook receiver under the Lambda runtime");
                lambda_http::run(app)
                    .await
                    .map_err(|e| anyhow::anyhow!(e))
                    .context("Lambda runtime failed")
            } else {
                let addr = bind.unwrap_or(config.webhook_bind);
                listener::serve(addr, app, shutdown::install())
                    .await
                    .with_context(|| format!("webhook server on {addr} failed"))
            }
        }
        Command::Consume => {
            let subscription = aws::bootstrap_subscription(&sdk_config, &config)
                .await
                .context("failed to provision the queue subscription")?;
            info!(
                queue_url = %subscription.queue.url(),
                queue_arn = %subscription.queue_arn,
                topic_arn = %subscription.topic_arn,
                "Queue subscribed to topic"
            );

            let consumer = Consumer::new(
                Arc::new(subscription.queue),
                Arc::new(R10kDeployer::new(config.r10k_bin.clone())),
            );
            consumer.run(shutdown::install()).await;
            Ok(())
        }
    }
}
