use crate::config::{ServiceDescriptor, ServiceRegistry};
use crate::core::accessor;
use crate::core::credentials::CredentialStore;
use crate::core::model::{ServiceSnapshot, SyncFailure};
use crate::utils::error::{ListsError, Result};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// One unresponsive directory must not stall a round longer than this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fans guild-count reads and writes out to every enabled bot-list service
/// in parallel and joins the per-service outcomes into one aggregate.
///
/// Each round spawns one task per enabled service and always joins all of
/// them; a failing service is recorded and never aborts its siblings. The
/// engine itself is policy-free about partial failure — it hands successes
/// and failures back separately and the caller decides whether a non-empty
/// failure list fails the round.
pub struct SyncEngine {
    registry: Arc<ServiceRegistry>,
    credentials: Arc<dyn CredentialStore>,
    client: Client,
}

impl SyncEngine {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            registry,
            credentials,
            client,
        })
    }

    /// Reads the current guild count from every enabled service concurrently.
    /// Returns exactly one outcome per enabled service: a snapshot on
    /// success, a tagged failure otherwise. Does not return until every
    /// spawned task has finished.
    pub async fn fetch_all(&self) -> (Vec<ServiceSnapshot>, Vec<SyncFailure>) {
        let mut snapshots = Vec::new();
        let mut failures = Vec::new();
        let mut tasks = JoinSet::new();

        for short_name in self.registry.all_enabled() {
            // Enumeration came from the registry itself, so describe()
            // cannot miss here.
            let descriptor = match self.registry.describe(short_name) {
                Ok(descriptor) => descriptor.clone(),
                Err(e) => {
                    failures.push(SyncFailure::tagged(short_name, e.to_string()));
                    continue;
                }
            };

            let client = self.client.clone();
            let credentials = Arc::clone(&self.credentials);

            tasks.spawn(async move {
                let short_name = descriptor.short_name.clone();
                let token = credentials.token(&short_name);
                (short_name, fetch_one(client, descriptor, token).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(snapshot))) => snapshots.push(snapshot),
                Ok((short_name, Err(e))) => {
                    tracing::warn!("Failed to fetch stats from {}: {}", short_name, e);
                    failures.push(SyncFailure::tagged(short_name, e.to_string()));
                }
                Err(e) => {
                    tracing::error!("Fetch task aborted: {}", e);
                    failures.push(SyncFailure::untagged(format!("fetch task aborted: {}", e)));
                }
            }
        }

        (snapshots, failures)
    }

    /// Pushes a new guild count to every enabled service concurrently and
    /// collects the per-service failures. Writes are not transactional
    /// across services: a service that already accepted the count stays
    /// updated even when a sibling fails.
    pub async fn post_all(&self, guild_count: i64, shard_count: i64) -> Vec<SyncFailure> {
        let mut failures = Vec::new();
        let mut tasks = JoinSet::new();

        for short_name in self.registry.all_enabled() {
            let descriptor = match self.registry.describe(short_name) {
                Ok(descriptor) => descriptor.clone(),
                Err(e) => {
                    failures.push(SyncFailure::tagged(short_name, e.to_string()));
                    continue;
                }
            };

            let client = self.client.clone();
            let credentials = Arc::clone(&self.credentials);

            tasks.spawn(async move {
                let short_name = descriptor.short_name.clone();
                let token = credentials.token(&short_name);
                (
                    short_name,
                    post_one(client, descriptor, token, guild_count, shard_count).await,
                )
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((short_name, Ok(()))) => {
                    tracing::debug!("Posted new guild count to {}", short_name);
                }
                Ok((short_name, Err(e))) => {
                    tracing::warn!("Failed to post stats to {}: {}", short_name, e);
                    failures.push(SyncFailure::tagged(short_name, e.to_string()));
                }
                Err(e) => {
                    tracing::error!("Post task aborted: {}", e);
                    failures.push(SyncFailure::untagged(format!("post task aborted: {}", e)));
                }
            }
        }

        failures
    }
}

async fn fetch_one(
    client: Client,
    descriptor: ServiceDescriptor,
    token: String,
) -> Result<ServiceSnapshot> {
    tracing::debug!(
        "Fetching stats for {} from {}",
        descriptor.short_name,
        descriptor.get_stats_url
    );

    let response = client
        .get(&descriptor.get_stats_url)
        .header("Authorization", token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ListsError::StatusError {
            service: descriptor.short_name,
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let document: Value = serde_json::from_str(&body)?;
    let guild_count = accessor::extract(&document, &descriptor.accessor)?;

    Ok(ServiceSnapshot {
        id: descriptor.id,
        short_name: descriptor.short_name,
        url: descriptor.url,
        guild_count,
        error: false,
    })
}

async fn post_one(
    client: Client,
    descriptor: ServiceDescriptor,
    token: String,
    guild_count: i64,
    shard_count: i64,
) -> Result<()> {
    let mut payload = serde_json::Map::new();
    payload.insert(descriptor.key.clone(), Value::from(guild_count));
    if descriptor.include_shard_count {
        payload.insert("shardCount".to_string(), Value::from(shard_count));
    }

    tracing::debug!(
        "Posting guild count {} to {} at {}",
        guild_count,
        descriptor.short_name,
        descriptor.post_stats_url
    );

    let response = client
        .post(&descriptor.post_stats_url)
        .header("Authorization", token)
        .json(&Value::Object(payload))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ListsError::StatusError {
            service: descriptor.short_name,
            status: status.as_u16(),
        });
    }

    // Body is decoded for the log only; services answer stats posts with
    // anything from JSON to an empty body, and none of it matters.
    match response.json::<Value>().await {
        Ok(body) => tracing::debug!("{} acknowledged stats post: {}", descriptor.short_name, body),
        Err(_) => tracing::debug!("{} returned a non-JSON acknowledgement", descriptor.short_name),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::StaticCredentials;
    use httpmock::prelude::*;

    fn registry_toml(server: &MockServer, enabled: &[(&str, bool)]) -> String {
        enabled
            .iter()
            .enumerate()
            .map(|(i, (name, enabled))| {
                format!(
                    r#"
[services.{name}]
id = {id}
short_name = "{name}"
long_name = "{name} directory"
url = "https://example.com/{name}"
get_stats_url = "{base}/{name}/stats"
post_stats_url = "{base}/{name}/stats"
accessor = "stats.guilds"
key = "guildCount"
enabled = {enabled}
"#,
                    name = name,
                    id = i as i64 + 1,
                    base = server.base_url(),
                    enabled = enabled,
                )
            })
            .collect()
    }

    fn engine(server: &MockServer, services: &[(&str, bool)]) -> SyncEngine {
        let registry = ServiceRegistry::from_toml_str(&registry_toml(server, services)).unwrap();
        SyncEngine::new(
            Arc::new(registry),
            Arc::new(StaticCredentials::new().with_token("alpha", "alpha-token")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_all_returns_one_snapshot_per_enabled_service() {
        let server = MockServer::start();

        let alpha = server.mock(|when, then| {
            when.method(GET)
                .path("/alpha/stats")
                .header("Authorization", "alpha-token");
            then.status(200)
                .json_body(serde_json::json!({"stats": {"guilds": 111}}));
        });
        let beta = server.mock(|when, then| {
            when.method(GET).path("/beta/stats");
            then.status(200)
                .json_body(serde_json::json!({"stats": {"guilds": 222}}));
        });

        let engine = engine(&server, &[("alpha", true), ("beta", true)]);
        let (mut snapshots, failures) = engine.fetch_all().await;

        alpha.assert();
        beta.assert();
        assert!(failures.is_empty());

        snapshots.sort_by(|a, b| a.short_name.cmp(&b.short_name));
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].guild_count, 111);
        assert_eq!(snapshots[1].guild_count, 222);
        assert!(!snapshots[0].error);
    }

    #[tokio::test]
    async fn test_fetch_all_never_contacts_disabled_services() {
        let server = MockServer::start();

        let alpha = server.mock(|when, then| {
            when.method(GET).path("/alpha/stats");
            then.status(200)
                .json_body(serde_json::json!({"stats": {"guilds": 5}}));
        });
        let beta = server.mock(|when, then| {
            when.method(GET).path("/beta/stats");
            then.status(200)
                .json_body(serde_json::json!({"stats": {"guilds": 5}}));
        });

        let engine = engine(&server, &[("alpha", true), ("beta", false)]);
        let (snapshots, failures) = engine.fetch_all().await;

        alpha.assert_hits(1);
        beta.assert_hits(0);
        assert_eq!(snapshots.len(), 1);
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_service_does_not_drop_sibling_successes() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/alpha/stats");
            then.status(200)
                .json_body(serde_json::json!({"stats": {"guilds": 42}}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/beta/stats");
            then.status(503);
        });

        let engine = engine(&server, &[("alpha", true), ("beta", true)]);
        let (snapshots, failures) = engine.fetch_all().await;

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].short_name, "alpha");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].service.as_deref(), Some("beta"));
        assert!(failures[0].message.contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_tagged_failure() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/alpha/stats");
            then.status(200).body("not json at all");
        });

        let engine = engine(&server, &[("alpha", true)]);
        let (snapshots, failures) = engine.fetch_all().await;

        assert!(snapshots.is_empty());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].service.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_misconfigured_accessor_is_a_tagged_failure() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/alpha/stats");
            then.status(200)
                .json_body(serde_json::json!({"guilds": 42}));
        });

        let engine = engine(&server, &[("alpha", true)]);
        let (snapshots, failures) = engine.fetch_all().await;

        assert!(snapshots.is_empty());
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("stats"));
    }

    #[tokio::test]
    async fn test_post_all_sends_configured_key_and_auth() {
        let server = MockServer::start();

        let alpha = server.mock(|when, then| {
            when.method(POST)
                .path("/alpha/stats")
                .header("Authorization", "alpha-token")
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"guildCount": 50000}));
            then.status(200).json_body(serde_json::json!({"ok": true}));
        });

        let engine = engine(&server, &[("alpha", true)]);
        let failures = engine.post_all(50000, 12).await;

        alpha.assert();
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_post_all_non_2xx_is_a_tagged_failure() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/alpha/stats");
            then.status(401);
        });

        let engine = engine(&server, &[("alpha", true)]);
        let failures = engine.post_all(50000, 12).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].service.as_deref(), Some("alpha"));
        assert!(failures[0].message.contains("401"));
    }

    #[tokio::test]
    async fn test_post_all_undecodable_acknowledgement_is_not_a_failure() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/alpha/stats");
            then.status(204);
        });

        let engine = engine(&server, &[("alpha", true)]);
        let failures = engine.post_all(50000, 12).await;

        assert!(failures.is_empty());
    }
}
