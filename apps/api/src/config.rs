use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::dialogue::engine::{DEFAULT_ALTERNATIVE_THRESHOLD, DEFAULT_MAX_TURNS};
use crate::dialogue::DialogueConfig;
use crate::llm_client::LlmSettings;
use crate::matching::semantic::DEFAULT_SIMILARITY_THRESHOLD;
use crate::scoring::CriterionWeights;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub max_turns: u32,
    pub similarity_threshold: f32,
    pub alternative_threshold: u8,
    pub max_output_tokens: u32,
    pub completion_timeout: Duration,
    pub embedding_timeout: Duration,
    pub session_ttl: Option<Duration>,
    pub scoring_weights: CriterionWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let similarity_threshold: f32 = parse_env("SIMILARITY_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD)?;
        if !(0.0..=1.0).contains(&similarity_threshold) {
            bail!("SIMILARITY_THRESHOLD must lie in [0, 1], got {similarity_threshold}");
        }

        let max_turns: u32 = parse_env("MAX_TURNS", DEFAULT_MAX_TURNS)?;
        if max_turns == 0 {
            bail!("MAX_TURNS must be at least 1");
        }

        let alternative_threshold: u8 = parse_env("ALTERNATIVE_THRESHOLD", DEFAULT_ALTERNATIVE_THRESHOLD)?;
        if alternative_threshold > 100 {
            bail!("ALTERNATIVE_THRESHOLD must lie in [0, 100], got {alternative_threshold}");
        }

        let scoring_weights = match optional_env("SCORING_WEIGHTS") {
            Some(raw) => CriterionWeights::from_overrides(&raw)
                .map_err(|e| anyhow::anyhow!("SCORING_WEIGHTS: {e}"))?,
            None => CriterionWeights::default(),
        };

        let session_ttl = optional_env("SESSION_TTL_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .context("SESSION_TTL_SECS must be a whole number of seconds")
            })
            .transpose()?
            .map(Duration::from_secs);

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: optional_env("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            embedding_dimensions: parse_env("EMBEDDING_DIMENSIONS", 1536)?,
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8001)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_turns,
            similarity_threshold,
            alternative_threshold,
            max_output_tokens: parse_env("MAX_OUTPUT_TOKENS", 800)?,
            completion_timeout: Duration::from_secs(parse_env("COMPLETION_TIMEOUT_SECS", 60)?),
            embedding_timeout: Duration::from_secs(parse_env("EMBEDDING_TIMEOUT_SECS", 10)?),
            session_ttl,
            scoring_weights,
        })
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.llm_api_key.clone(),
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone(),
            embedding_model: self.embedding_model.clone(),
            embedding_dimensions: self.embedding_dimensions,
        }
    }

    pub fn dialogue_config(&self) -> DialogueConfig {
        DialogueConfig {
            max_turns: self.max_turns,
            alternative_threshold: self.alternative_threshold,
            max_output_tokens: self.max_output_tokens,
            completion_timeout: self.completion_timeout,
            session_ttl: self.session_ttl,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
