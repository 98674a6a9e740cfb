use crate::utils::error::{ListsError, Result};
use crate::utils::validation::{validate_accessor, validate_url, Validate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One bot-list directory the bot is listed on. Loaded once at startup and
/// never mutated afterwards; the registry is the single source of truth for
/// endpoints, response shape and payload shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescriptor {
    pub id: i64,
    pub short_name: String,
    pub long_name: String,
    /// Public listing page, echoed back in snapshots.
    pub url: String,
    pub get_stats_url: String,
    pub post_stats_url: String,
    /// Dot-path into the stats response, e.g. "stats.guilds".
    pub accessor: String,
    /// Field name the service expects the guild count under when posting.
    pub key: String,
    /// Some directories reject a stats post without a shardCount field.
    #[serde(default)]
    pub include_shard_count: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRegistry {
    services: BTreeMap<String, ServiceDescriptor>,
}

impl ServiceRegistry {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ListsError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let registry: ServiceRegistry =
            toml::from_str(content).map_err(|e| ListsError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;

        registry.validate()?;
        Ok(registry)
    }

    /// Short names of every enabled service, in deterministic
    /// (lexicographic) order. Evaluated fresh on each call.
    pub fn all_enabled(&self) -> Vec<&str> {
        self.services
            .values()
            .filter(|descriptor| descriptor.enabled)
            .map(|descriptor| descriptor.short_name.as_str())
            .collect()
    }

    pub fn describe(&self, short_name: &str) -> Result<&ServiceDescriptor> {
        self.services
            .get(short_name)
            .ok_or_else(|| ListsError::UnknownService(short_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Validate for ServiceRegistry {
    fn validate(&self) -> Result<()> {
        for (name, descriptor) in &self.services {
            if *name != descriptor.short_name {
                return Err(ListsError::InvalidConfigValueError {
                    field: format!("services.{}.short_name", name),
                    value: descriptor.short_name.clone(),
                    reason: "short_name must match the services table key".to_string(),
                });
            }

            validate_url(
                &format!("services.{}.url", name),
                &descriptor.url,
            )?;
            validate_url(
                &format!("services.{}.get_stats_url", name),
                &descriptor.get_stats_url,
            )?;
            validate_url(
                &format!("services.{}.post_stats_url", name),
                &descriptor.post_stats_url,
            )?;
            validate_accessor(
                &format!("services.{}.accessor", name),
                &descriptor.accessor,
            )?;

            if descriptor.key.is_empty() {
                return Err(ListsError::InvalidConfigValueError {
                    field: format!("services.{}.key", name),
                    value: descriptor.key.clone(),
                    reason: "Post payload key cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}
