use super::models::Config;
use crate::humanize::ByteSize;
use thiserror::Error;

/// Hard ceiling for `server.max_body_bytes`
const MAX_BODY_BYTES_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid store uri '{uri}': {reason}")]
    InvalidStoreUri { uri: String, reason: String },

    #[error("max_body_bytes ({actual}) exceeds limit of {limit}")]
    BodyLimitExceedsCeiling { actual: ByteSize, limit: ByteSize },

    #[error("max_body_bytes must be positive")]
    ZeroBodyLimit,

    #[error("telemetry.log_filter must not be empty")]
    EmptyLogFilter,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(config)?;
    validate_body_limit(config)?;
    validate_telemetry(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<(), ValidationError> {
    config.store_target().map(|_| ())
}

fn validate_body_limit(config: &Config) -> Result<(), ValidationError> {
    let actual = config.server.max_body_bytes;

    if actual.as_u64() == 0 {
        return Err(ValidationError::ZeroBodyLimit);
    }

    if actual.as_u64() > MAX_BODY_BYTES_LIMIT {
        return Err(ValidationError::BodyLimitExceedsCeiling {
            actual,
            limit: ByteSize(MAX_BODY_BYTES_LIMIT),
        });
    }

    Ok(())
}

fn validate_telemetry(config: &Config) -> Result<(), ValidationError> {
    if config.telemetry.log_filter.trim().is_empty() {
        return Err(ValidationError::EmptyLogFilter);
    }
    Ok(())
}
