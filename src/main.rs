//! Subfetch - YouTube transcripts as SBV subtitle files
//!
//! Entry point: parses arguments, sets up logging, loads settings, and starts
//! the interactive shell.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subfetch::app::App;
use subfetch::cli::{Args, Commands};
use subfetch::config::{ConfigLoader, ConfigSource, Settings, STATE_DIR};
use subfetch::remote::function_url;
use subfetch::shell;
use subfetch::ui::{render, Page, ViewController};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;
    info!("Starting Subfetch");

    let mut settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => {
            if Path::new("settings.toml").exists() {
                info!("Found settings.toml in current directory, loading...");
                Settings::from_file("settings.toml")?
            } else {
                Settings::default()
            }
        }
    };
    if let Some(dir) = args.download_dir {
        settings.ui.download_dir = dir;
    }

    let source = ConfigSource::parse(&args.config);

    match args.command.unwrap_or(Commands::Shell) {
        Commands::Endpoint => {
            let config = ConfigLoader::load(&source).await?;
            println!(
                "{}",
                function_url(
                    &config.cloud_function_region,
                    &config.cloud_function_project,
                    &settings.functions
                )
            );
        }
        Commands::Shell => {
            let view = ViewController::bind(Page::standard())?;
            let app = match App::start(&source, &settings, view.clone()).await {
                Ok(app) => app,
                Err(e) => {
                    // the banner explains the failure to the user
                    print!("{}", render(&view.snapshot()));
                    return Err(e.into());
                }
            };

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&app, stdin, std::io::stdout()).await?;
            info!("Subfetch finished");
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(STATE_DIR).join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subfetch.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so it never mixes with the page
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
