// Runtime configuration for the planner and the booking flow

use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "EASYHOLIDAY_DATA_DIR";
pub const ENV_OLLAMA_URL: &str = "EASYHOLIDAY_OLLAMA_URL";
pub const ENV_OLLAMA_MODEL: &str = "EASYHOLIDAY_OLLAMA_MODEL";
pub const ENV_LLM_TIMEOUT_MS: &str = "EASYHOLIDAY_LLM_TIMEOUT_MS";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

// Pricing and validation policy applied by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPolicy {
    // Surcharge over flights + accommodation for activities and local transport
    pub buffer_percent: u64,
    // Budget warning fires above this share of the stated budget
    pub budget_tolerance_percent: u64,
    pub fallback_flight_candidates: usize,
    pub min_trip_days: u32,
    pub max_trip_days: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            buffer_percent: 20,
            budget_tolerance_percent: 120,
            fallback_flight_candidates: 5,
            min_trip_days: 2,
            max_trip_days: 14,
        }
    }
}

impl BookingPolicy {
    /// `floor(base_cost * buffer_percent / 100)`
    pub fn buffer_for(&self, base_cost: u64) -> u64 {
        base_cost.saturating_mul(self.buffer_percent) / 100
    }

    /// `floor(budget * budget_tolerance_percent / 100)`
    pub fn budget_ceiling(&self, budget: u64) -> u64 {
        budget.saturating_mul(self.budget_tolerance_percent) / 100
    }
}

// Settings for the itinerary generation model
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_ms: u64,
    pub max_itineraries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen3:4b-instruct".to_string(),
            temperature: 0.2,
            timeout_ms: 120_000,
            max_itineraries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub policy: BookingPolicy,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            policy: BookingPolicy::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `EASYHOLIDAY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup(ENV_OLLAMA_MODEL) {
            config.llm.model = model;
        }
        if let Some(raw) = lookup(ENV_LLM_TIMEOUT_MS) {
            config.llm.timeout_ms = match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_LLM_TIMEOUT_MS.to_string(),
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}
