//! Runtime configuration.
//!
//! Settings are read from the environment once at startup; a `.env` file
//! is honored when present (loaded in `main`). Both access tokens are
//! required and the process refuses to start without them.

use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default chat model for the summary request.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default bound on the whole summary call, stream included.
const DEFAULT_SUMMARY_TIMEOUT_SECS: u64 = 60;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot access token (`BOT_TOKEN`)
    pub bot_token: String,

    /// OpenAI API key (`OPENAI_API_KEY`)
    pub openai_token: String,

    /// Chat model used for the summary (`PATROL_MODEL`)
    pub model: String,

    /// API root for the summary endpoint (`PATROL_OPENAI_BASE_URL`)
    pub openai_base_url: String,

    /// Upper bound on the summary call (`PATROL_SUMMARY_TIMEOUT_SECS`)
    pub summary_timeout: Duration,
}

impl Settings {
    /// Load settings from the environment, failing fast on missing or
    /// empty secrets.
    pub fn from_env() -> Result<Self> {
        let bot_token = require("BOT_TOKEN")?;
        let openai_token = require("OPENAI_API_KEY")?;

        let model = std::env::var("PATROL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let openai_base_url = std::env::var("PATROL_OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());

        let timeout_secs = match std::env::var("PATROL_SUMMARY_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("PATROL_SUMMARY_TIMEOUT_SECS is not a number")?,
            Err(_) => DEFAULT_SUMMARY_TIMEOUT_SECS,
        };

        Ok(Self {
            bot_token,
            openai_token,
            model,
            openai_base_url,
            summary_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Read a required environment variable, rejecting empty values.
fn require(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{name} is not set"),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn with_tokens<T>(f: impl FnOnce() -> T) -> T {
        std::env::set_var("BOT_TOKEN", "test-bot-token");
        std::env::set_var("OPENAI_API_KEY", "test-ai-token");
        let result = f();
        std::env::remove_var("BOT_TOKEN");
        std::env::remove_var("OPENAI_API_KEY");
        result
    }

    #[test]
    #[serial(patrol_env)]
    fn test_settings_require_bot_token() {
        std::env::remove_var("BOT_TOKEN");
        std::env::set_var("OPENAI_API_KEY", "test-ai-token");

        let result = Settings::from_env();

        std::env::remove_var("OPENAI_API_KEY");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("BOT_TOKEN"));
    }

    #[test]
    #[serial(patrol_env)]
    fn test_settings_reject_empty_token() {
        std::env::set_var("BOT_TOKEN", "   ");
        std::env::set_var("OPENAI_API_KEY", "test-ai-token");

        let result = Settings::from_env();

        std::env::remove_var("BOT_TOKEN");
        std::env::remove_var("OPENAI_API_KEY");
        assert!(result.is_err());
    }

    #[test]
    #[serial(patrol_env)]
    fn test_settings_defaults() {
        let settings = with_tokens(|| {
            std::env::remove_var("PATROL_MODEL");
            std::env::remove_var("PATROL_OPENAI_BASE_URL");
            std::env::remove_var("PATROL_SUMMARY_TIMEOUT_SECS");
            Settings::from_env().unwrap()
        });

        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(settings.summary_timeout, Duration::from_secs(60));
    }

    #[test]
    #[serial(patrol_env)]
    fn test_settings_timeout_override() {
        let settings = with_tokens(|| {
            std::env::set_var("PATROL_SUMMARY_TIMEOUT_SECS", "5");
            let settings = Settings::from_env().unwrap();
            std::env::remove_var("PATROL_SUMMARY_TIMEOUT_SECS");
            settings
        });

        assert_eq!(settings.summary_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial(patrol_env)]
    fn test_settings_rejects_bad_timeout() {
        let result = with_tokens(|| {
            std::env::set_var("PATROL_SUMMARY_TIMEOUT_SECS", "soon");
            let result = Settings::from_env();
            std::env::remove_var("PATROL_SUMMARY_TIMEOUT_SECS");
            result
        });

        assert!(result.is_err());
    }
}
