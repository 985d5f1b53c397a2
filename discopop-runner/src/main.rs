use anyhow::Result;
use clap::Parser;
use discopop_runner_core::RunnerConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        2.. => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = RunnerConfig::load_or_default(cli.config.as_deref())?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Discopop(args) => {
            info!("DiscoPoP command: {:?}", args);
            block_on(cli::commands::discopop::execute(args, config))?;
        }
        Commands::Hotspots(args) => {
            info!("Hotspots command: {:?}", args);
            block_on(cli::commands::hotspots::execute(args, config))?;
        }
        Commands::Optimize(args) => {
            info!("Optimize command: {:?}", args);
            block_on(cli::commands::optimize::execute(args, config))?;
        }
        Commands::Results(args) => {
            debug!("Results command: {:?}", args);
            block_on(cli::commands::results::execute(args))?;
        }
        Commands::Patch(args) => {
            info!("Patch command: {:?}", args);
            block_on(cli::commands::patch::execute(args, config))?;
        }
        Commands::Doctor => {
            block_on(cli::commands::doctor::execute(config))?;
        }
        Commands::Steps(args) => {
            info!("Steps command: {:?}", args);
            block_on(cli::commands::steps::execute(args, config))?;
        }
    }

    Ok(())
}

/// Each command gets its own async runtime
fn block_on<F: Future<Output = Result<()>>>(command: F) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(command);
    // An interrupted confirmation prompt may still be blocked on stdin
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}
