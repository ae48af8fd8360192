use std::path::Path;

use anyhow::Context;
use ozone::callbacks::PrintDot;
use ozone::{workflow, WorkflowConfig};
use tracing_subscriber::EnvFilter;

/// Optional overrides, read from the working directory when present.
const CONFIG_FILE: &str = "ozone.toml";

fn main() -> anyhow::Result<()> {
    init_logging();
    println!("{}", ozone::banner());

    let config = if Path::new(CONFIG_FILE).exists() {
        WorkflowConfig::load(CONFIG_FILE).with_context(|| format!("loading {}", CONFIG_FILE))?
    } else {
        WorkflowConfig::default()
    };

    let report = workflow::run_with_observer(&config, &mut PrintDot::stdout())
        .with_context(|| format!("training on {}", config.data_path.display()))?;

    println!("{}", report.evaluation);
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ozone=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
