//! Service configuration read from the process environment.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Gemini endpoint and model selection.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub video_model: String,
    /// Upper bound on retrying transient upstream failures
    pub retry_max_elapsed: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            retry_max_elapsed: Duration::from_secs(60),
        }
    }
}

/// Video operation polling.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` polls until the operation completes
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(600)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub gemini: GeminiConfig,
    pub poll: PollConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024, // 10MB, as advertised by the form
            gemini: GeminiConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// `GEMINI_API_KEY` takes precedence over `API_KEY`. Blank values count as unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env_non_empty("GEMINI_API_KEY").or_else(|| env_non_empty("API_KEY"));

        let poll_timeout = match env_parse::<u64>("VIDEO_POLL_TIMEOUT_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.poll.timeout,
        };

        Self {
            bind_addr: env_non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            gemini: GeminiConfig {
                api_key,
                base_url: env_non_empty("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
                text_model: env_non_empty("ADGEN_TEXT_MODEL").unwrap_or(defaults.gemini.text_model),
                image_model: env_non_empty("ADGEN_IMAGE_MODEL")
                    .unwrap_or(defaults.gemini.image_model),
                video_model: env_non_empty("ADGEN_VIDEO_MODEL")
                    .unwrap_or(defaults.gemini.video_model),
                retry_max_elapsed: env_parse::<u64>("GEMINI_RETRY_MAX_ELAPSED_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.gemini.retry_max_elapsed),
            },
            poll: PollConfig {
                interval: env_parse::<u64>("VIDEO_POLL_INTERVAL_SECS")
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.poll.interval),
                timeout: poll_timeout,
            },
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.poll.interval, Duration::from_secs(10));
        assert_eq!(config.gemini.text_model, "gemini-2.5-flash");
        assert_eq!(config.gemini.image_model, "imagen-4.0-generate-001");
        assert_eq!(config.gemini.video_model, "veo-2.0-generate-001");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.gemini.api_key.is_none());
    }
}
