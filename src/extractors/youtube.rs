use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::{CaptionExtractor, ExtractorOutput, RunOutcome};
use crate::config::ExtractorConfig;
use crate::TranscriptError;

/// YouTube caption extractor using yt-dlp
pub struct YtDlpExtractor {
    yt_dlp_path: String,
    timeout: Duration,
    player_client: String,
    subtitle_format: String,
}

impl YtDlpExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            yt_dlp_path: config.binary.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            player_client: config.player_client.clone(),
            subtitle_format: config.subtitle_format.clone(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Command-line arguments for a captions-only run
    pub fn build_args(&self, url: &str, workdir: &Path, cookie_file: &Path) -> Vec<String> {
        let output_template = workdir.join("%(id)s.%(ext)s");

        vec![
            // Auto-generated captions only, no media
            "--write-auto-subs".to_string(),
            "--sub-format".to_string(),
            self.subtitle_format.clone(),
            "--skip-download".to_string(),
            "--cookies".to_string(),
            cookie_file.to_string_lossy().into_owned(),
            "--no-check-certificates".to_string(),
            "--no-warnings".to_string(),
            // Mobile client identity is less likely to hit bot checks
            "--extractor-args".to_string(),
            format!("youtube:player_client={}", self.player_client),
            "--no-playlist".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl CaptionExtractor for YtDlpExtractor {
    async fn fetch_captions(
        &self,
        url: &str,
        workdir: &Path,
        cookie_file: &Path,
    ) -> Result<RunOutcome, TranscriptError> {
        let args = self.build_args(url, workdir, cookie_file);
        tracing::debug!("Executing command: {} {}", self.yt_dlp_path, args.join(" "));

        let mut child = Command::new(&self.yt_dlp_path)
            .args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscriptError::Spawn {
                binary: self.yt_dlp_path.clone(),
                source,
            })?;

        // `wait_with_output` consumes the child and would leave nothing to kill on
        // timeout, so drain the pipes separately.
        let mut stdout_task = tokio::spawn(drain(child.stdout.take(), "stdout"));
        let mut stderr_task = tokio::spawn(drain(child.stderr.take(), "stderr"));

        // One deadline for the exit and both drains: a backgrounded grandchild can
        // hold the pipes open after the downloader itself has exited.
        let finished = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await;
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            (status, stdout, stderr)
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok((status, stdout, stderr)) => (status?, stdout, stderr),
            Err(_) => {
                tracing::warn!(
                    "{} exceeded {}s, killing it",
                    self.yt_dlp_path,
                    self.timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {}: {}", self.yt_dlp_path, e);
                }
                stdout_task.abort();
                stderr_task.abort();
                return Ok(RunOutcome::TimedOut(self.timeout));
            }
        };

        Ok(RunOutcome::Completed(ExtractorOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }))
    }

    fn subtitle_extension(&self) -> String {
        self.subtitle_format.clone()
    }

    fn tool_name(&self) -> String {
        self.yt_dlp_path.clone()
    }
}

async fn drain<R>(pipe: Option<R>, name: &'static str) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!("Failed to read downloader {}: {}", name, e);
        }
    }
    buf
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}
