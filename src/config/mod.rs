use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "CAPTIONIST_CONFIG";

/// Upper bounds that keep backoff arithmetic well away from overflow
const MAX_RETRY_DELAY_SECS: u64 = 3600;
const MAX_JITTER_SECS: f64 = 3600.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Downloader invocation settings
    pub extractor: ExtractorConfig,

    /// Retry and backoff settings
    pub retry: RetryConfig,

    /// Cookie jar settings
    pub cookies: CookieConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Path or name of the yt-dlp binary
    pub binary: String,

    /// Hard limit for a single downloader run
    pub timeout_secs: u64,

    /// YouTube player client passed through `--extractor-args`
    pub player_client: String,

    /// Subtitle format requested from the downloader and searched for on disk
    pub subtitle_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts per request
    pub max_retries: u32,

    /// Base delay between attempts
    pub retry_delay_secs: u64,

    /// Lower bound of the random jitter added after a rate limit
    pub jitter_min_secs: f64,

    /// Upper bound (exclusive) of the random jitter added after a rate limit
    pub jitter_max_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Environment variable holding an optional `NID=value` session cookie
    pub session_env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout_secs: 60,
            player_client: "android".to_string(),
            subtitle_format: "vtt".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_secs: 2,
            jitter_min_secs: 1.0,
            jitter_max_secs: 3.0,
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            session_env: "YT_SESSION_COOKIE".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the config file if one exists, then
    /// environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Locate the config file, if any
    fn config_path() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }

        // Current directory first for easy local runs
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        let user_config = dirs::config_dir()?.join("captionist").join("config.yaml");
        user_config.exists().then_some(user_config)
    }

    /// Apply environment overrides. The lookup is injected so tests don't touch
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {:?}", port))?;
        }
        if let Some(binary) = lookup("CAPTIONIST_YTDLP") {
            self.extractor.binary = binary;
        }
        if let Some(timeout) = lookup("CAPTIONIST_TIMEOUT_SECS") {
            self.extractor.timeout_secs = timeout
                .trim()
                .parse()
                .context("CAPTIONIST_TIMEOUT_SECS must be a whole number of seconds")?;
        }
        if let Some(retries) = lookup("CAPTIONIST_MAX_RETRIES") {
            self.retry.max_retries = retries
                .trim()
                .parse()
                .context("CAPTIONIST_MAX_RETRIES must be a whole number")?;
        }
        if let Some(delay) = lookup("CAPTIONIST_RETRY_DELAY_SECS") {
            self.retry.retry_delay_secs = delay
                .trim()
                .parse()
                .context("CAPTIONIST_RETRY_DELAY_SECS must be a whole number of seconds")?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extractor.binary.trim().is_empty() {
            anyhow::bail!("extractor.binary must not be empty");
        }
        if self.extractor.timeout_secs == 0 {
            anyhow::bail!("extractor.timeout_secs must be greater than zero");
        }
        if self.retry.max_retries == 0 {
            anyhow::bail!("retry.max_retries must be at least 1");
        }
        if self.retry.retry_delay_secs > MAX_RETRY_DELAY_SECS {
            anyhow::bail!("retry.retry_delay_secs must be at most {}", MAX_RETRY_DELAY_SECS);
        }
        let (min, max) = (self.retry.jitter_min_secs, self.retry.jitter_max_secs);
        if !min.is_finite() || !max.is_finite() || max > MAX_JITTER_SECS {
            anyhow::bail!("retry jitter bounds must be finite and at most {}s", MAX_JITTER_SECS);
        }
        if min < 0.0 || min > max {
            anyhow::bail!("retry jitter range must satisfy 0 <= jitter_min_secs <= jitter_max_secs");
        }
        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen: {}:{}", self.server.host, self.server.port);
        println!("  Downloader: {}", self.extractor.binary);
        println!("  Timeout: {}s", self.extractor.timeout_secs);
        println!("  Player client: {}", self.extractor.player_client);
        println!("  Subtitle format: {}", self.extractor.subtitle_format);
        println!("  Max retries: {}", self.retry.max_retries);
        println!("  Retry delay: {}s", self.retry.retry_delay_secs);
        println!(
            "  Rate-limit jitter: {:.1}s..{:.1}s",
            self.retry.jitter_min_secs, self.retry.jitter_max_secs
        );
        println!("  Session cookie variable: {}", self.cookies.session_env);
    }
}
