//! gatehouse-probe
//!
//! Runs the access-control matrix against a running application and reports
//! each case. Exits non-zero when any case fails.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_client::Target;
use gatehouse_client::matrix::{self, CaseReport};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "gatehouse-probe", version, about = "Probe form-login access rules")]
struct Cli {
    /// Base URL of the application under test.
    #[arg(long, env = "GATEHOUSE_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let target = Target::new(&cli.base_url)
        .with_context(|| format!("invalid base URL {}", cli.base_url))?
        .with_timeout(Duration::from_secs(cli.timeout_secs));

    info!(base_url = %target.base(), "Probing");
    let reports = matrix::run(&target, &matrix::default_matrix())
        .await
        .context("failed to build HTTP client")?;

    match cli.format {
        Format::Text => print_text(&reports),
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    if reports.iter().all(|r| r.passed) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_text(reports: &[CaseReport]) {
    for report in reports {
        let status = report
            .status
            .map_or_else(|| "---".to_string(), |s| s.to_string());
        let verdict = if report.passed { "PASS" } else { "FAIL" };
        println!("{verdict} {status} {}", report.name);
        if let Some(error) = &report.error {
            println!("     {error}");
        }
    }

    let failed = reports.iter().filter(|r| !r.passed).count();
    println!("{} cases, {failed} failed", reports.len());
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
