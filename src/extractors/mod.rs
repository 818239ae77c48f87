use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub mod cookies;
pub mod youtube;

use crate::TranscriptError;

/// Marker the downloader prints on stderr when YouTube rate limits us
pub const RATE_LIMIT_MARKER: &str = "HTTP Error 429";

/// Captured result of a downloader run that exited on its own
#[derive(Debug, Clone, Default)]
pub struct ExtractorOutput {
    /// Exit code, `None` when the process was ended by a signal
    pub exit_code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,
}

impl ExtractorOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Whether stderr carries the HTTP 429 diagnostic
    pub fn is_rate_limited(&self) -> bool {
        self.stderr.contains(RATE_LIMIT_MARKER)
    }
}

/// How a downloader run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The process exited (successfully or not) within the time limit
    Completed(ExtractorOutput),

    /// The time limit elapsed and the process was killed
    TimedOut(Duration),
}

/// Trait for tools that write a video's auto-generated captions into a directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionExtractor: Send + Sync {
    /// Fetch captions for `url` into `workdir`, authenticating with the cookie
    /// jar at `cookie_file`. Non-zero exits are reported, not raised.
    async fn fetch_captions(
        &self,
        url: &str,
        workdir: &Path,
        cookie_file: &Path,
    ) -> Result<RunOutcome, TranscriptError>;

    /// Subtitle file extension this extractor produces
    fn subtitle_extension(&self) -> String;

    /// Name of the underlying tool, for logs
    fn tool_name(&self) -> String;
}

/// Validate a YouTube video URL.
///
/// Accepts `youtube.com/watch?v=<id>` (with or without `www.`/`m.`) and
/// `youtu.be/<id>` over http or https.
pub fn validate_youtube_url(url: &str) -> Result<Url, TranscriptError> {
    let invalid = || TranscriptError::InvalidUrl(url.to_string());

    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }

    let host = parsed.host_str().ok_or_else(invalid)?.to_ascii_lowercase();

    let video_id = match host.as_str() {
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => {
            if parsed.path() != "/watch" {
                return Err(invalid());
            }
            parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        }
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        _ => None,
    };

    match video_id {
        Some(id) if is_video_id(&id) => Ok(parsed),
        _ => Err(invalid()),
    }
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_watch_urls() {
        assert!(validate_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_ok());
        assert!(validate_youtube_url("https://youtube.com/watch?v=dQw4w9WgXcQ&t=42s").is_ok());
        assert!(validate_youtube_url("http://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").is_ok());
    }

    #[test]
    fn test_accepts_short_urls() {
        assert!(validate_youtube_url("https://youtu.be/dQw4w9WgXcQ").is_ok());
        assert!(validate_youtube_url("https://youtu.be/dQw4w9WgXcQ?si=abc").is_ok());
    }

    #[test]
    fn test_rejects_other_urls() {
        assert!(validate_youtube_url("https://example.com/video").is_err());
        assert!(validate_youtube_url("https://www.youtube.com/").is_err());
        assert!(validate_youtube_url("https://www.youtube.com/watch").is_err());
        assert!(validate_youtube_url("https://www.youtube.com/watch?v=").is_err());
        assert!(validate_youtube_url("https://youtu.be/").is_err());
        assert!(validate_youtube_url("https://notyoutube.com/watch?v=abc").is_err());
        assert!(validate_youtube_url("ftp://youtube.com/watch?v=abc").is_err());
        assert!(validate_youtube_url("not a url").is_err());
        assert!(validate_youtube_url("https://www.youtube.com/watch?v=abc;rm -rf").is_err());
    }

    #[test]
    fn test_rate_limit_detection() {
        let output = ExtractorOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "ERROR: Unable to download: HTTP Error 429: Too Many Requests".into(),
        };
        assert!(output.is_rate_limited());
        assert!(!output.success());
        assert!(!ExtractorOutput::default().is_rate_limited());
    }
}
