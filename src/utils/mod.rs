use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::extractors::youtube::YtDlpExtractor;

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else if total_seconds > 0 {
        format!("{}s", secs)
    } else {
        format!("{:.1}s", seconds.max(0.0))
    }
}

/// Count words in a transcript for summary output
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Write a transcript to `path`, creating parent directories as needed
pub fn write_transcript(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(path, text)?;
    Ok(())
}

/// Check if the current environment has required tools
pub async fn check_dependencies(config: &Config) -> Vec<String> {
    let mut missing = Vec::new();

    if !YtDlpExtractor::new(&config.extractor).check_availability().await {
        missing.push(format!(
            "{} - required to download captions (https://github.com/yt-dlp/yt-dlp)",
            config.extractor.binary
        ));
    }

    missing
}
