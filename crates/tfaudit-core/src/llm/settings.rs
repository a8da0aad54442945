use anyhow::{Context, Result};
use std::collections::HashMap;

/// Environment-driven configuration for the inference client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceSettings {
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub timeout_secs: Option<u64>,
}

impl InferenceSettings {
    const ENDPOINT_ENV: &'static str = "TFAUDIT_ENDPOINT";
    const MODEL_ENV: &'static str = "TFAUDIT_MODEL";
    const API_KEY_ENV: &'static str = "TFAUDIT_API_KEY";
    const HF_TOKEN_ENV: &'static str = "HF_TOKEN";
    const MAX_TOKENS_ENV: &'static str = "TFAUDIT_MAX_TOKENS";
    const TIMEOUT_ENV: &'static str = "TFAUDIT_TIMEOUT_SECS";

    pub const DEFAULT_MODEL: &'static str = "mistralai/Mistral-7B-Instruct-v0.2";
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;

    /// Load settings from environment variables.
    ///
    /// * `TFAUDIT_ENDPOINT`   — Optional endpoint/base URL override.
    /// * `TFAUDIT_MODEL`      — Model identifier (default: Mistral-7B-Instruct).
    /// * `TFAUDIT_API_KEY`    — API token; falls back to `HF_TOKEN` (required).
    /// * `TFAUDIT_MAX_TOKENS` — Reply-length ceiling (default: 2048).
    pub fn from_env() -> Result<Self> {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let endpoint = vars
            .get(Self::ENDPOINT_ENV)
            .cloned()
            .filter(|v| !v.trim().is_empty());
        let model = vars
            .get(Self::MODEL_ENV)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());
        let api_key = vars
            .get(Self::API_KEY_ENV)
            .or_else(|| vars.get(Self::HF_TOKEN_ENV))
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .with_context(|| {
                format!(
                    "environment variable {} (or {}) must be set to call the inference API",
                    Self::API_KEY_ENV,
                    Self::HF_TOKEN_ENV
                )
            })?;
        let max_tokens = vars
            .get(Self::MAX_TOKENS_ENV)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(Self::DEFAULT_MAX_TOKENS);
        let timeout_secs = vars
            .get(Self::TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok());

        Ok(Self {
            endpoint,
            model,
            api_key,
            max_tokens,
            timeout_secs,
        })
    }
}
