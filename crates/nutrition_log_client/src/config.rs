use crate::NutritionError;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Clone, Debug)]
pub struct Config {
    /// Bearer token issued by the external login service.
    pub token: SecretString,
    pub base_url: String,
    /// Deadline for each remote call, retries included.
    pub request_timeout: Duration,
    /// Extra attempts for idempotent lookups. Commits are never retried.
    pub max_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, NutritionError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, NutritionError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let token = get("NUTRITION_LOG_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NutritionError::Config("NUTRITION_LOG_TOKEN missing".into()))?;
        let base_url = get("NUTRITION_LOG_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout_secs = match get("NUTRITION_LOG_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(NutritionError::Config(format!(
                        "NUTRITION_LOG_TIMEOUT_SECS must be a positive integer, got {raw:?}"
                    )));
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };
        let max_retries = match get("NUTRITION_LOG_MAX_RETRIES") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                NutritionError::Config(format!(
                    "NUTRITION_LOG_MAX_RETRIES must be a non-negative integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_MAX_RETRIES,
        };
        Ok(Self {
            token: SecretString::new(token.into()),
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }
}
