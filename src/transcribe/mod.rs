use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, RetryConfig};
use crate::extractors::cookies::{session_cookie_from_env, write_cookie_file};
use crate::extractors::youtube::YtDlpExtractor;
use crate::extractors::{validate_youtube_url, CaptionExtractor, RunOutcome};
use crate::subtitles;
use crate::TranscriptError;

/// How much downloader stdout to echo into debug logs
const STDOUT_LOG_LIMIT: usize = 500;

/// Plain-text transcript of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Cleaned caption text, lines joined by single spaces
    pub text: String,

    /// Attempt that produced it
    pub attempts: u32,
}

/// Bounded retry schedule with two backoff policies: linear after ordinary
/// failures, linear-plus-jitter after rate limiting.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            jitter_min: Duration::from_secs_f64(config.jitter_min_secs),
            jitter_max: Duration::from_secs_f64(config.jitter_max_secs),
        }
    }

    /// Delay after a failure that was not a rate limit
    pub fn failure_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Delay after a rate limit on `attempt`: `retry_delay * attempt` plus jitter
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.jitter_min;
        }
        let secs = rand::thread_rng()
            .gen_range(self.jitter_min.as_secs_f64()..self.jitter_max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Where a request is in its retry loop
#[derive(Debug)]
pub enum AttemptState {
    /// Running attempt `n` (1-based)
    Attempting(u32),

    /// Attempt `n` was rate limited
    RateLimited(u32),

    /// Attempt `n` failed for another retryable reason
    Errored(u32, TranscriptError),

    /// Transcript produced on attempt `n`
    Succeeded(u32, String),

    /// No attempts left
    Failed(TranscriptError),
}

impl AttemptState {
    /// Classify the result of attempt `attempt`
    pub fn from_attempt(attempt: u32, result: Result<String, TranscriptError>) -> Self {
        match result {
            Ok(text) => AttemptState::Succeeded(attempt, text),
            Err(TranscriptError::RateLimited) => AttemptState::RateLimited(attempt),
            Err(error) if error.is_retryable() => AttemptState::Errored(attempt, error),
            Err(error) => AttemptState::Failed(error),
        }
    }
}

/// Drives the caption extractor through cookie provisioning, extraction and
/// cleaning, retrying per [`RetryPolicy`]
pub struct TranscriptPipeline {
    extractor: Arc<dyn CaptionExtractor>,
    policy: RetryPolicy,
    session_env: String,
}

impl TranscriptPipeline {
    pub fn new(extractor: Arc<dyn CaptionExtractor>, policy: RetryPolicy, session_env: impl Into<String>) -> Self {
        Self {
            extractor,
            policy,
            session_env: session_env.into(),
        }
    }

    /// Pipeline backed by yt-dlp as configured
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(YtDlpExtractor::new(&config.extractor)),
            RetryPolicy::from_config(&config.retry),
            config.cookies.session_env.clone(),
        )
    }

    /// Fetch the transcript for a YouTube URL, retrying transient failures
    pub async fn fetch_transcript(&self, url: &str) -> Result<Transcript, TranscriptError> {
        validate_youtube_url(url)?;

        let span = tracing::info_span!("transcript", request_id = %Uuid::new_v4(), url = %url);
        self.run(url).instrument(span).await
    }

    async fn run(&self, url: &str) -> Result<Transcript, TranscriptError> {
        let mut state = AttemptState::Attempting(1);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    tracing::info!("Attempt {}/{}", attempt, self.policy.max_retries);
                    AttemptState::from_attempt(attempt, self.attempt(url).await)
                }
                AttemptState::RateLimited(attempt) => {
                    if !self.policy.has_attempts_left(attempt) {
                        AttemptState::Failed(exhausted(attempt, TranscriptError::RateLimited))
                    } else {
                        let delay = self.policy.rate_limit_delay(attempt);
                        tracing::warn!(
                            "Rate limited on attempt {}, waiting {:.1}s",
                            attempt,
                            delay.as_secs_f64()
                        );
                        sleep(delay).await;
                        AttemptState::Attempting(attempt + 1)
                    }
                }
                AttemptState::Errored(attempt, error) => {
                    if !self.policy.has_attempts_left(attempt) {
                        AttemptState::Failed(exhausted(attempt, error))
                    } else {
                        let delay = self.policy.failure_delay();
                        tracing::warn!(
                            "Attempt {} failed: {}; retrying in {}s",
                            attempt,
                            error,
                            delay.as_secs()
                        );
                        sleep(delay).await;
                        AttemptState::Attempting(attempt + 1)
                    }
                }
                AttemptState::Succeeded(attempt, text) => {
                    tracing::info!("Transcript extracted on attempt {} ({} chars)", attempt, text.len());
                    return Ok(Transcript { text, attempts: attempt });
                }
                AttemptState::Failed(error) => {
                    tracing::error!("Transcript extraction failed: {}", error);
                    return Err(error);
                }
            };
        }
    }

    /// One attempt inside a fresh working directory. The directory, cookie jar
    /// and any subtitle files are removed before this returns.
    async fn attempt(&self, url: &str) -> Result<String, TranscriptError> {
        let workdir = tempfile::Builder::new().prefix("captionist-").tempdir()?;

        let session_cookie = session_cookie_from_env(&self.session_env);
        let cookie_file = write_cookie_file(workdir.path(), session_cookie.as_deref())?;

        let outcome = self
            .extractor
            .fetch_captions(url, workdir.path(), &cookie_file)
            .await;

        let result = match outcome {
            Err(e) => Err(e),
            Ok(RunOutcome::TimedOut(limit)) => Err(TranscriptError::Timeout(limit.as_secs())),
            Ok(RunOutcome::Completed(output)) => {
                tracing::debug!(
                    exit_code = ?output.exit_code,
                    "{} stdout: {}",
                    self.extractor.tool_name(),
                    truncate(&output.stdout, STDOUT_LOG_LIMIT)
                );
                if !output.stderr.trim().is_empty() {
                    tracing::debug!("{} stderr: {}", self.extractor.tool_name(), output.stderr.trim());
                }

                if output.is_rate_limited() {
                    Err(TranscriptError::RateLimited)
                } else {
                    match subtitles::extract_transcript(workdir.path(), &self.extractor.subtitle_extension()) {
                        Err(TranscriptError::NoSubtitleProduced) if !output.success() => {
                            Err(TranscriptError::NonZeroExit(output.exit_code))
                        }
                        other => other,
                    }
                }
            }
        };

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            tracing::warn!("Failed to remove working directory {}: {}", path.display(), e);
        }

        result
    }
}

fn exhausted(attempts: u32, last: TranscriptError) -> TranscriptError {
    TranscriptError::ExhaustedRetries {
        attempts,
        last: Box::new(last),
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
