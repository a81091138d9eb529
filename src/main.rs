//! Metrics Advisor CLI entry point.

use metrics_advisor::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await?;
    Ok(())
}
