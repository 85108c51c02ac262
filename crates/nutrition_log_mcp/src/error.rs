//! Errors surfaced to MCP clients as tool failures.

use nutrition_log_client::NutritionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("API error: {0}")]
    Api(#[from] NutritionError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl McpError {
    /// Short machine-readable category, prefixed to the message returned to the caller.
    pub fn kind(&self) -> &'static str {
        match self {
            McpError::Api(e) if e.is_unauthenticated() => "unauthenticated",
            McpError::Api(e) if e.is_validation() => "validation",
            McpError::Api(NutritionError::NotFound(_)) => "not_found",
            McpError::Api(e) if e.is_transport() => "transport",
            McpError::Api(_) => "api",
            McpError::Validation(_) => "validation",
        }
    }
}

impl From<McpError> for String {
    fn from(err: McpError) -> Self {
        format!("[{}] {}", err.kind(), err)
    }
}
