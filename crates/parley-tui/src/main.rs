//! Parley terminal client entry point.

use std::{fs::File, sync::Mutex};

use clap::Parser;
use parley_tui::{Args, Runtime, SystemEnv, TerminalDriver};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.client_config()?;
    tracing::info!(
        server = config.server_addr(),
        username = config.username(),
        gated = config.access_code().is_some(),
        "starting client"
    );

    let driver = TerminalDriver::new()?;
    let runtime = Runtime::new(driver, SystemEnv::new(), config);

    Ok(runtime.run().await?)
}

/// Log to `--log-file` if given. The terminal belongs to the UI, so there is
/// no console output.
fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
