use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.input_directories.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one input directory is required".to_string(),
        });
    }

    if config.descriptions_table.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "descriptions_table must not be empty".to_string(),
        });
    }

    if config.batch_size == 0 {
        return Err(ConfigError::Validation {
            message: "batch_size must be at least 1".to_string(),
        });
    }

    if config.max_images_per_object == 0 {
        return Err(ConfigError::Validation {
            message: "max_images_per_object must be at least 1".to_string(),
        });
    }

    if config.request_cooldown_secs < 0.0 {
        return Err(ConfigError::Validation {
            message: "request_cooldown_secs must not be negative".to_string(),
        });
    }

    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if config.retry.base_delay_secs <= 0.0 || config.retry.max_delay_secs <= 0.0 {
        return Err(ConfigError::Validation {
            message: "retry delays must be positive".to_string(),
        });
    }

    if config.retry.max_delay_secs < config.retry.base_delay_secs {
        return Err(ConfigError::Validation {
            message: "retry.max_delay_secs must not be below retry.base_delay_secs".to_string(),
        });
    }

    Ok(())
}
