//! genofetch CLI - Main entry point

use clap::Parser;
use genofetch_cli::{commands, Cli, Commands};
use genofetch_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use genofetch_core::RequestContext;
use std::process;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Verbose mode logs debug to the console, otherwise only warnings
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("genofetch")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().overlay_env().unwrap_or(log_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    let ctx = cli.request_context();
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            interrupt.cancel();
        }
    });

    if let Err(e) = execute_command(&cli, &ctx).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, ctx: &RequestContext) -> genofetch_cli::Result<()> {
    let config = cli.client_config();

    match &cli.command {
        Commands::Fetch { seq_type, ids } => {
            commands::fetch::run(ctx, &config, (*seq_type).into(), ids, cli.format).await
        }

        Commands::Gene { query } => commands::gene::run(ctx, &config, query, cli.format).await,

        Commands::Lookup { id, object_type } => {
            commands::lookup::run(ctx, &config, id, object_type.map(Into::into), cli.format).await
        }

        Commands::MapAssembly {
            species,
            from,
            region,
            to,
        } => commands::map::run(ctx, &config, species, from, region, to, cli.format).await,

        Commands::Ping => commands::ping::run(ctx, &config, cli.format).await,
    }
}
