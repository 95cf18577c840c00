use crate::config::ConfigError;
use crate::orchestration::RunError;
use thiserror::Error;

/// Top-level failure of a backtest invocation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Backtest failed: {0}")]
    Run(#[from] RunError),
}

impl AppError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Database(_) | AppError::Run(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::FeedError;

    #[test]
    fn test_config_error_exit_code() {
        let err: AppError = ConfigError::MissingEnv("START_DATE".to_string()).into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: START_DATE"
        );
    }

    #[test]
    fn test_run_error_wraps_feed_error() {
        let err: AppError = RunError::from(FeedError::RateLimited).into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Backtest failed: Rate limited");
    }
}
