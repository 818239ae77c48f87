//! Subtitle discovery and WebVTT-to-text cleaning.
//!
//! The cleaner is deliberately literal: it keeps every caption line in order,
//! including the repeated lines YouTube's rolling auto-captions produce, and
//! joins them with single spaces.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::TranscriptError;

/// Header lines that carry metadata rather than caption text
const HEADER_PREFIXES: &[&str] = &["WEBVTT", "Kind:", "Language:"];

/// Token separating cue start and end times
const CUE_ARROW: &str = "-->";

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    // Non-greedy: each `<` pairs with the next `>`
    TAG.get_or_init(|| Regex::new(r"<.*?>").expect("tag pattern is valid"))
}

/// Find the subtitle file produced in `dir`.
///
/// Files are matched on `extension` (case-insensitive). When several exist the
/// lexicographically first name wins.
pub fn locate_subtitle(dir: &Path, extension: &str) -> Result<PathBuf, TranscriptError> {
    let mut candidates: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();

    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or(TranscriptError::NoSubtitleProduced)
}

/// Strip cue numbers, timings, headers and inline tags from WebVTT content.
///
/// Returns `None` when nothing but markup remains.
pub fn clean_vtt(content: &str) -> Option<String> {
    let lines: Vec<String> = content
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.contains(CUE_ARROW))
        .filter(|line| !is_cue_number(line))
        .filter(|line| !HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix)))
        .map(|line| tag_pattern().replace_all(line, "").trim().to_string())
        // A line of nothing but tags would otherwise leave a stray separator
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return None;
    }

    Some(lines.join(" "))
}

fn is_cue_number(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(char::is_numeric)
}

/// Locate the subtitle file in `dir`, read it and clean it
pub fn extract_transcript(dir: &Path, extension: &str) -> Result<String, TranscriptError> {
    let path = locate_subtitle(dir, extension)?;
    tracing::debug!("Reading subtitle file: {}", path.display());

    let bytes = fs_err::read(&path)?;
    let content = String::from_utf8_lossy(&bytes);

    clean_vtt(&content).ok_or(TranscriptError::EmptyTranscript)
}
