use crate::utils::error::{DevReadyError, Result};
use regex::Regex;
use std::path::{Component, Path};
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn parse_http_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.trim().is_empty() {
        return Err(DevReadyError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    let url = Url::parse(url_str.trim()).map_err(|e| DevReadyError::InvalidConfigValue {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(DevReadyError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Unsupported URL scheme: {}", scheme),
        }),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    parse_http_url(field_name, url_str).map(|_| ())
}

/// Accepts only relative paths that stay below their root.
pub fn validate_relative_path(field_name: &str, path: &str) -> Result<()> {
    let reason = if path.is_empty() {
        Some("Path cannot be empty")
    } else if path.contains('\0') {
        Some("Path contains null bytes")
    } else if Path::new(path).is_absolute() {
        Some("Path must be relative to the project directory")
    } else if Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        Some("Path must not contain '..'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DevReadyError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DevReadyError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_millis(field_name: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(DevReadyError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.as_millis().to_string(),
            reason: "Value must be at least 1ms".to_string(),
        });
    }
    Ok(())
}

pub fn compile_pattern(field_name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| DevReadyError::InvalidConfigValue {
        field: field_name.to_string(),
        value: pattern.to_string(),
        reason: format!("Invalid regular expression: {}", e),
    })
}
