use serde::{Deserialize, Serialize};

/// One service's successfully retrieved guild count for a single sync round.
/// Built fresh per round; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub id: i64,
    pub short_name: String,
    pub url: String,
    pub guild_count: i64,
    pub error: bool,
}

/// One service's failure during a sync round. A service produces either a
/// snapshot or a failure, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub message: String,
}

impl SyncFailure {
    pub fn tagged(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            message: message.into(),
        }
    }

    /// For failures that cannot be attributed to a single service,
    /// e.g. an aborted task.
    pub fn untagged(message: impl Into<String>) -> Self {
        Self {
            service: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub services: Vec<ServiceSnapshot>,
    pub last_updated: i64,
}
