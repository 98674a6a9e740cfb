use crate::utils::error::{ListsError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ListsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ListsError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ListsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_accessor(field_name: &str, accessor: &str) -> Result<()> {
    if accessor.is_empty() || accessor.split('.').any(|segment| segment.is_empty()) {
        return Err(ListsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: accessor.to_string(),
            reason: "Accessor must be a non-empty dot-separated path".to_string(),
        });
    }

    Ok(())
}
