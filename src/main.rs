//! Card Insights - CSV in; SQLite, query results, charts and a preview out.

use anyhow::Context;
use card_insights::{Pipeline, PipelineConfig};

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = PipelineConfig::load().context("Failed to load configuration")?;
    let summary = Pipeline::new(config).run().context("Pipeline failed")?;

    // Each failure was already logged when it happened
    if !summary.is_success() {
        anyhow::bail!("{} output(s) could not be written", summary.failures.len());
    }

    Ok(())
}

/// Initialize the logging system; `RUST_LOG` overrides the default level.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("card_insights=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
