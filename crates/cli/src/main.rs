//! `reach-launch` -- create or update an SMS campaign from a JSON file.
//!
//! Walks the six wizard steps with the values from `--campaign`, printing
//! each step, then launches the campaign (skipped with `--dry-run`).
//!
//! # Environment variables
//!
//! | Variable                     | Required | Default                     | Description                     |
//! |------------------------------|----------|-----------------------------|---------------------------------|
//! | `REACH_API_URL`              | no       | `http://localhost:8000/api` | Backend base URL                |
//! | `REACH_API_TOKEN`            | no       | --                          | Bearer token                    |
//! | `REACH_WORKSPACE_ID`         | no       | --                          | Sent as `X-Workspace-Id`        |
//! | `REACH_CLIENT_ID`            | no       | --                          | Sent as `X-Client-Id`           |
//! | `REACH_REQUEST_TIMEOUT_SECS` | no       | `15`                        | Per-request timeout             |
//! | `RUST_LOG`                   | no       | `reach_cli=info,...`        | Log filter                      |

use std::sync::Arc;

use clap::Parser;

use reach_cli::args::Args;
use reach_cli::run::{self, RunOutcome};
use reach_client::{ClientConfig, SmsApi};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reach_cli=info,reach_wizard=info,reach_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Usage errors exit with code 2, `--help` and `--version` with 0.
    let args = Args::parse();

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid client configuration");
        std::process::exit(1);
    });
    let backend = SmsApi::new(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    tracing::info!(
        api_url = %config.api_url,
        campaign = %args.campaign.display(),
        edit = args.edit.as_deref(),
        dry_run = args.dry_run,
        "Starting reach-launch",
    );

    match run::run(&args, Arc::new(backend)).await {
        Ok(RunOutcome::DryRun) => {}
        Ok(RunOutcome::Launched(report)) => {
            if !report.is_complete() {
                tracing::warn!(
                    campaign_id = %report.campaign_id,
                    "Campaign saved but some steps failed",
                );
            }
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "reach-launch failed");
            std::process::exit(1);
        }
    }
}
