mod compare;
mod config;
mod edgar;
mod error;
mod holdings;
mod report;

use anyhow::Context;
use compare::QuarterReport;
use config::{ReportConfig, DEFAULT_LOG_LEVEL};
use edgar::EdgarClient;
use std::io::{self, BufRead, Write};
use tracing::info;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(io::stderr)
        .init();
}

/// Ask for the fund's CIK. Input is passed through as typed, minus whitespace.
fn get_user_input() -> io::Result<String> {
    print!("Enter 10-digit CIK number: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = ReportConfig::default();

    let cik = get_user_input().context("reading CIK from stdin")?;
    info!("Fetching the two latest 13F-HR reports for CIK {}", cik);

    let client = EdgarClient::new(&config)?;
    let (current, prior) = client
        .fetch_latest_quarters(&cik)
        .await
        .with_context(|| format!("fetching 13F reports for CIK {cik}"))?;

    let report = QuarterReport::build(&current, &prior);
    report::write_report(&report, &config.output_path)
        .with_context(|| format!("writing {}", config.output_path.display()))?;

    Ok(())
}
