use anyhow::{Context, Result};
use dagapp_catalog::demo::{self, DemoConfig};
use dagapp_monitoring::MonitoringConfig;
use tracing::info;

fn main() -> Result<()> {
    dagapp_monitoring::init(&MonitoringConfig::from_env())
        .context("Failed to initialize monitoring")?;

    // Environment first, command line arguments on top
    let config = DemoConfig::load()
        .with_args(std::env::args().skip(1))
        .context("Invalid command line arguments")?;
    info!(config = ?config, "Demo configuration loaded");

    let report = demo::run(&config)
        .with_context(|| format!("Failed to run the {} calculator", config.calculator))?;

    let rendered = serde_json::to_string_pretty(&report).context("Failed to render the report")?;
    println!("{}", rendered);
    Ok(())
}
