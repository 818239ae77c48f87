use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use captionist::api::{self, AppState};
use captionist::cli::{Cli, Commands, LogFormat};
use captionist::config::Config;
use captionist::transcribe::TranscriptPipeline;
use captionist::utils;

fn init_tracing(verbose: bool, format: LogFormat) {
    let default_filter = if verbose {
        "captionist=debug,tower_http=debug"
    } else {
        "captionist=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr so `fetch` output stays clean on stdout
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn warn_missing_dependencies(config: &Config) {
    let missing_deps = utils::check_dependencies(config).await;
    for dep in missing_deps {
        tracing::warn!("Dependency check: {} (continuing anyway)", dep);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let mut config = Config::load()?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            warn_missing_dependencies(&config).await;

            let state = AppState::new(TranscriptPipeline::from_config(&config));
            api::start_http_server(&config.server, state).await?;
        }
        Commands::Fetch { url, output } => {
            warn_missing_dependencies(&config).await;

            let pipeline = TranscriptPipeline::from_config(&config);

            let progress = if cli.quiet {
                ProgressBar::hidden()
            } else {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .context("Invalid progress template")?,
                );
                spinner.enable_steady_tick(Duration::from_millis(120));
                spinner
            };
            progress.set_message("Fetching captions with yt-dlp...");

            let started = Instant::now();
            let result = pipeline.fetch_transcript(&url).await;
            progress.finish_and_clear();

            let transcript = result.context("Failed to get transcript")?;
            tracing::info!(
                "Fetched {} words in {} ({} attempt(s))",
                utils::word_count(&transcript.text),
                utils::format_duration(started.elapsed().as_secs_f64()),
                transcript.attempts
            );

            match output {
                Some(path) => {
                    utils::write_transcript(&path, &transcript.text)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => println!("{}", transcript.text),
            }
        }
        Commands::Config => {
            config.display();
        }
    }

    Ok(())
}
