use crate::config::types::{
    ClientConfig, Config, DelayRange, ListingConfig, OutputConfig, SchedulerConfig, SectionEntry,
};
use crate::ConfigError;
use url::Url;

/// Longest a fetch may keep polling a challenge page for real content
pub const MAX_CHALLENGE_WAIT_SECS: u64 = 15;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_listing_config(&config.listing)?;
    validate_output_config(&config.output)?;
    validate_sections(&config.sections)?;
    Ok(())
}

/// Validates client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if !config.detail_path.contains("{key}") {
        return Err(ConfigError::Validation(format!(
            "detail-path must contain the {{key}} placeholder, got '{}'",
            config.detail_path
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.challenge_wait_secs > MAX_CHALLENGE_WAIT_SECS {
        return Err(ConfigError::Validation(format!(
            "challenge-wait-secs must be <= {}, got {}",
            MAX_CHALLENGE_WAIT_SECS, config.challenge_wait_secs
        )));
    }

    if config.challenge_wait_secs > 0 && config.challenge_poll_secs == 0 {
        return Err(ConfigError::Validation(
            "challenge-poll-secs must be >= 1 when challenge-wait-secs is set".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry, pacing and budget policy
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.cooldown_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "cooldown-threshold must be >= 1, got {}",
            config.cooldown_threshold
        )));
    }

    validate_delay_range("rate-limit-delay-secs", &config.rate_limit_delay)?;
    validate_delay_range("normal-delay-secs", &config.normal_delay)?;

    if config.time_budget_secs == 0 {
        return Err(ConfigError::Validation(
            "time-budget-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// A jitter range must be a non-empty, non-negative half-open interval
fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be finite and non-negative, got [{}, {})",
            name, range.min, range.max
        )));
    }

    if range.min >= range.max {
        return Err(ConfigError::Validation(format!(
            "{} must have min < max, got [{}, {})",
            name, range.min, range.max
        )));
    }

    Ok(())
}

/// Exactly one listing source: a page + table id, or a CSV file
fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    match (&config.url, &config.csv_path) {
        (Some(url), None) => {
            validate_http_url("listing url", url)?;
            match &config.table_id {
                Some(id) if !id.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::Validation(
                        "listing table-id is required when listing url is set".to_string(),
                    ))
                }
            }
        }
        (None, Some(path)) => {
            if path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "listing csv-path cannot be empty".to_string(),
                ));
            }
        }
        (Some(_), Some(_)) => {
            return Err(ConfigError::Validation(
                "listing must set either url or csv-path, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(ConfigError::Validation(
                "listing must set url or csv-path".to_string(),
            ))
        }
    }

    if config.key_column.is_empty() || config.label_column.is_empty() {
        return Err(ConfigError::Validation(
            "listing key-column and label-column cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.failure_log.is_empty() {
        return Err(ConfigError::Validation(
            "failure-log cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates daily section entries
fn validate_sections(sections: &[SectionEntry]) -> Result<(), ConfigError> {
    for section in sections {
        if section.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "section name cannot be empty".to_string(),
            ));
        }

        validate_http_url(&format!("section '{}' url", section.name), &section.url)?;

        if section.table_id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "section '{}' must have a table-id",
                section.name
            )));
        }
    }

    Ok(())
}

fn validate_http_url(name: &str, raw: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, raw
        )));
    }

    Ok(())
}
