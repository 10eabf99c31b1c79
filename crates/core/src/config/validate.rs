use super::{types::Config, ConfigError};

/// Checks the invariants a parsed configuration must satisfy before the
/// pipeline starts.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "telegram.bot_token must not be empty".to_string(),
        ));
    }
    if config.telegram.target_chat_id == 0 {
        return Err(ConfigError::ValidationError(
            "telegram.target_chat_id must be set".to_string(),
        ));
    }
    if config.publisher.max_group_size == 0 || config.publisher.max_group_size > 10 {
        return Err(ConfigError::ValidationError(format!(
            "publisher.max_group_size must be between 1 and 10, got {}",
            config.publisher.max_group_size
        )));
    }
    if config.publisher.fetch_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "publisher.fetch_attempts must be at least 1".to_string(),
        ));
    }
    if config.publisher.relay_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "publisher.relay_attempts must be at least 1".to_string(),
        ));
    }
    if config.transcoder.target_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder.target_size_bytes must be nonzero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_toml() -> &'static str {
        r#"
[telegram]
bot_token = "123:abc"
target_chat_id = -1001234
"#
    }

    #[test]
    fn test_valid_config_passes() {
        let config = load_config_from_str(valid_toml()).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = load_config_from_str(valid_toml()).unwrap();
        config.telegram.bot_token = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_oversized_group_rejected() {
        let mut config = load_config_from_str(valid_toml()).unwrap();
        config.publisher.max_group_size = 11;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = load_config_from_str(valid_toml()).unwrap();
        config.publisher.fetch_attempts = 0;
        assert!(validate_config(&config).is_err());
    }
}
