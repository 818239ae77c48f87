//! Captionist - turn YouTube auto-generated captions into plain-text transcripts
//!
//! This library drives `yt-dlp` to fetch a video's auto-generated WebVTT captions,
//! retries around rate limiting and transient failures, and strips cue timing and
//! markup down to flat text. The `api` module exposes it over HTTP.

pub mod api;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod subtitles;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, LogFormat};
pub use config::Config;
pub use extractors::{CaptionExtractor, ExtractorOutput, RunOutcome};
pub use transcribe::{RetryPolicy, Transcript, TranscriptPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to transcript extraction
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Missing video URL")]
    MissingUrl,

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloader timed out after {0}s")]
    Timeout(u64),

    #[error("Downloader exited with status {0:?}")]
    NonZeroExit(Option<i32>),

    #[error("Rate limited by YouTube (HTTP 429)")]
    RateLimited,

    #[error("No subtitle file produced")]
    NoSubtitleProduced,

    #[error("Subtitle file contained no transcript text")]
    EmptyTranscript,

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Giving up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        last: Box<TranscriptError>,
    },
}

impl TranscriptError {
    /// Input errors are reported straight back to the caller; everything else is
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TranscriptError::MissingUrl
                | TranscriptError::InvalidUrl(_)
                | TranscriptError::ExhaustedRetries { .. }
        )
    }
}
