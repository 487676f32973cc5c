use anyhow::{Context, Result};
use clap::Parser;
use micwatch::cli::Cli;
use micwatch::{
    ConfigManager, DEFAULT_LOG_LEVEL, LOG_ENV, Monitor, StreamSink, UsageRecordSource, VERSION,
    default_source,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize the logger. Stdout carries the state stream, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Load config
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_config_path(path),
        None => ConfigManager::new()?,
    };
    if cli.print_config_path {
        println!("{}", config_manager.config_path().display());
        return Ok(());
    }
    let config = cli.apply(config_manager.load()?);
    config.validate()?;
    if cli.write_config {
        config_manager.save(&config)?;
        info!(path = ?config_manager.config_path(), "configuration written");
        return Ok(());
    }

    // Set up the record source
    let mut source = default_source().context("Failed to create microphone usage source")?;
    source
        .check_available()
        .with_context(|| format!("Failed to open {}", source.name()))?;

    info!(version = VERSION, format = %config.format, "micwatch starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let mut monitor = Monitor::new(source);
    let mut sink = StreamSink::stdout(config.format);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    runtime
        .block_on(monitor.run(config.poll_interval(), &mut sink, shutdown))
        .context("Output stream failed")?;

    info!("micwatch stopped");
    Ok(())
}
