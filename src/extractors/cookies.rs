use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};

use crate::TranscriptError;

/// File name of the cookie jar inside an attempt's working directory
pub const COOKIE_FILE_NAME: &str = "cookies.txt";

/// Generic consent cookie that skips the EU consent interstitial
const CONSENT_COOKIE: (&str, &str) = ("CONSENT", "YES+cb.20210328-17-p0.en+FX+000");

/// The only session cookie name passed through to the downloader
const SESSION_COOKIE_NAME: &str = "NID";

/// One line of a Netscape cookie jar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieEntry {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    pub expires: i64,
    pub name: String,
    pub value: String,
}

impl CookieEntry {
    fn new(domain: &str, name: &str, value: &str, expires: i64) -> Self {
        Self {
            domain: domain.to_string(),
            include_subdomains: true,
            path: "/".to_string(),
            secure: true,
            expires,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn to_line(&self) -> String {
        let flag = |b: bool| if b { "TRUE" } else { "FALSE" };
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.domain,
            flag(self.include_subdomains),
            self.path,
            flag(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }
}

/// Parse a `NAME=VALUE` session cookie. Only `NID` is honored.
pub fn parse_session_cookie(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.trim().split_once('=')?;
    let (name, value) = (name.trim(), value.trim());

    if name != SESSION_COOKIE_NAME || value.is_empty() || value.contains(['\t', '\n', '\r']) {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

/// Build the cookie jar entries for one attempt
pub fn cookie_entries(session_cookie: Option<&str>) -> Vec<CookieEntry> {
    let expires = (Utc::now() + Duration::days(365)).timestamp();

    let mut entries = vec![CookieEntry::new(
        ".youtube.com",
        CONSENT_COOKIE.0,
        CONSENT_COOKIE.1,
        expires,
    )];

    match session_cookie.map(|raw| (raw, parse_session_cookie(raw))) {
        Some((_, Some((name, value)))) => {
            entries.push(CookieEntry::new(".google.com", &name, &value, expires));
        }
        Some((raw, None)) if !raw.trim().is_empty() => {
            tracing::warn!("Ignoring malformed session cookie; expected {}=<value>", SESSION_COOKIE_NAME);
        }
        _ => {}
    }

    entries
}

/// Write a Netscape-format cookie jar into `dir` and return its path.
///
/// The file lives as long as `dir`; callers clean it up by dropping the
/// directory.
pub fn write_cookie_file(dir: &Path, session_cookie: Option<&str>) -> Result<PathBuf, TranscriptError> {
    let mut content = String::from("# Netscape HTTP Cookie File\n");
    for entry in cookie_entries(session_cookie) {
        let _ = writeln!(content, "{}", entry.to_line());
    }

    let path = dir.join(COOKIE_FILE_NAME);
    fs_err::write(&path, content)?;
    Ok(path)
}

/// Read the session cookie from the environment. Done per attempt so a
/// rotated value is picked up without a restart.
pub fn session_cookie_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
