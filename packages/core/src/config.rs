use anyhow::{Context, Result};
use docstore::RetryPolicy;
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Attempt budget for optimistic store transactions before a decision
    /// surfaces `ConflictRetryExhausted`.
    pub tx_retry_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            tx_retry_attempts: env::var("TX_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("TX_RETRY_ATTEMPTS must be a valid number")?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::attempts(self.tx_retry_attempts)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tx_retry_attempts: RetryPolicy::default().attempts,
        }
    }
}
