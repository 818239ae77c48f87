use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "captionist",
    about = "Captionist - plain-text transcripts from YouTube auto-generated captions",
    version,
    long_about = "Serves an HTTP endpoint that turns a YouTube video URL into the plain text of its auto-generated captions. Captions are fetched with yt-dlp, retried around rate limiting, and stripped of cue timing and markup."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (overrides config and HOST)
        #[arg(long, value_name = "ADDR")]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Fetch a single transcript and print it
    Fetch {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}
