//! Configuration validation

use crate::config::types::ShellConfig;
use crate::error::{ConfigError, ConfigResult};

/// Validate a complete configuration
pub fn validate_config(config: &ShellConfig) -> ConfigResult<()> {
    if config.command_prefix.is_empty() {
        return Err(ConfigError::Invalid("command-prefix must not be empty".to_string()));
    }

    for (prefix, command) in &config.shortcuts {
        validate_shortcut(prefix, command)?;
    }

    Ok(())
}

fn validate_shortcut(prefix: &str, command: &str) -> ConfigResult<()> {
    if prefix.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "Shortcut for '{}' has an empty prefix",
            command
        )));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "Shortcut '{}' must not contain whitespace",
            prefix
        )));
    }
    if command.is_empty() || command.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!(
            "Shortcut '{}' must expand to a single command name",
            prefix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ShellConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_whitespace_shortcut() {
        let mut config = ShellConfig::default();
        config.shortcuts.insert("a b".to_string(), "help".to_string());
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let config = ShellConfig {
            command_prefix: String::new(),
            ..ShellConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
