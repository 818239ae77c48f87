#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use captionist::api::{self, AppState};
use captionist::config::Config;
use captionist::transcribe::TranscriptPipeline;
use tempfile::TempDir;

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=abc123";

/// Writes a WebVTT file next to the `-o` template and records the cookie jar
/// path it was given.
pub const WRITE_SUBTITLES: &str = r#"
dir=$(dirname "$out")
printf 'WEBVTT\nKind: captions\nLanguage: en\n\n00:00:00.000 --> 00:00:01.000\nHello<00:00:00.500><c> from</c><00:00:00.800><c> captions</c>\n' > "$dir/abc123.en.vtt"
"#;

pub struct Fixture {
    pub dir: TempDir,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl Fixture {
    /// Cookie jar paths the stub downloader saw, one per run
    pub fn cookie_paths(&self) -> Vec<PathBuf> {
        fs_err::read_to_string(self.dir.path().join("cookies.log"))
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }

    pub fn runs(&self) -> usize {
        self.cookie_paths().len()
    }
}

/// Shell stub standing in for yt-dlp. Parses `-o` and `--cookies`, logs the
/// cookie path, then runs `body`.
fn write_stub(dir: &Path, body: &str) -> PathBuf {
    let log = dir.join("cookies.log");
    let script = format!(
        r#"#!/bin/sh
out=""
cookies=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    --cookies) cookies="$2"; shift ;;
  esac
  shift
done
echo "$cookies" >> "{log}"
{body}
"#,
        log = log.display(),
        body = body
    );

    let path = dir.join("yt-dlp-stub");
    fs_err::write(&path, script).unwrap();
    fs_err::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Start the service on an ephemeral port backed by a stub downloader
pub async fn setup_test_server<F>(stub_body: &str, tweak: F) -> Fixture
where
    F: FnOnce(&mut Config),
{
    let dir = tempfile::tempdir().unwrap();
    let stub = write_stub(dir.path(), stub_body);

    let mut config = Config::default();
    config.extractor.binary = stub.to_string_lossy().into_owned();
    config.extractor.timeout_secs = 5;
    config.retry.max_retries = 3;
    config.retry.retry_delay_secs = 0;
    config.retry.jitter_min_secs = 0.0;
    config.retry.jitter_max_secs = 0.0;
    config.cookies.session_env = "CAPTIONIST_TEST_UNSET_COOKIE".to_string();
    tweak(&mut config);
    config.validate().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let state = AppState::new(TranscriptPipeline::from_config(&config));
    tokio::spawn(async move {
        let _ = api::serve(listener, state).await;
    });

    Fixture {
        dir,
        base_url,
        client: reqwest::Client::new(),
    }
}
