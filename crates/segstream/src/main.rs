use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod logging;
mod ui;

use cli::{App, Commands};

fn main() -> Result<()> {
    let app = App::parse();
    let settings = config::load(app.config.as_deref(), &app.overrides())
        .context("Failed to load configuration")?;

    match app.cmd.unwrap_or_default() {
        Commands::Fetch(arg) => {
            let guard = logging::init_logging(&settings.log_dir)
                .with_context(|| format!("Failed to set up logging in {}", settings.log_dir.display()))?;
            info!(path = %guard.path.display(), "logging to file");
            arg.run(settings)
        }
        Commands::Locate(arg) => arg.run(&settings),
    }
}
