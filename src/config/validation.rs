use crate::config::types::{
    Config, FacilityEntry, HarvestConfig, OutputConfig, SessionEngine, TargetConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Longest allowed wait for a record table to render
pub const MAX_MARKER_TIMEOUT_MS: u64 = 120_000;

/// Longest allowed overall HTTP request timeout
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_target_config(&config.target)?;
    validate_output_config(&config.output)?;
    validate_facilities(&config.facilities)?;
    Ok(())
}

/// Validates identifier space and pipeline sizing
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.years.is_empty() {
        return Err(ConfigError::Validation(
            "years must list at least one year code".to_string(),
        ));
    }

    for year in &config.years {
        validate_code("year", year)?;
    }

    if config.max_sequence < 1 {
        return Err(ConfigError::Validation(
            "max_sequence must be >= 1".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.marker_timeout_ms > MAX_MARKER_TIMEOUT_MS {
        return Err(ConfigError::Validation(format!(
            "marker_timeout_ms must be <= {}ms, got {}ms",
            MAX_MARKER_TIMEOUT_MS, config.marker_timeout_ms
        )));
    }

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates the target URL template
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if !config.url_template.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "url_template must contain an {{id}} placeholder, got '{}'",
            config.url_template
        )));
    }

    // The template must be a valid URL once an identifier is substituted
    let sample = config.url_template.replace("{id}", "000000000");
    let url = Url::parse(&sample).map_err(|e| {
        ConfigError::Validation(format!("Invalid url_template '{}': {}", config.url_template, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url_template must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and {}, got {}",
            MAX_REQUEST_TIMEOUT_SECS, config.request_timeout_secs
        )));
    }

    if config.engine == SessionEngine::Chrome && !cfg!(feature = "chrome") {
        return Err(ConfigError::Validation(
            "engine 'chrome' requires a build with the `chrome` feature".to_string(),
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

    if config.image_directory.is_empty() {
        return Err(ConfigError::Validation(
            "image_directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the category space
fn validate_facilities(facilities: &[FacilityEntry]) -> Result<(), ConfigError> {
    if facilities.is_empty() {
        return Err(ConfigError::Validation(
            "at least one facility must be configured".to_string(),
        ));
    }

    let mut seen_facilities = HashSet::new();
    for facility in facilities {
        validate_code("facility", &facility.code)?;

        if !seen_facilities.insert(facility.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate facility code '{}'",
                facility.code
            )));
        }

        if facility.departments.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Facility '{}' must have at least one department",
                facility.code
            )));
        }

        let mut seen_departments = HashSet::new();
        for department in &facility.departments {
            validate_code("department", &department.code)?;

            if !seen_departments.insert(department.code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate department code '{}' in facility '{}'",
                    department.code, facility.code
                )));
            }
        }
    }

    Ok(())
}

/// Identifier components are fixed-width two-digit codes
fn validate_code(kind: &str, code: &str) -> Result<(), ConfigError> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Validation(format!(
            "{} code must be two digits, got '{}'",
            kind, code
        )));
    }
    Ok(())
}
