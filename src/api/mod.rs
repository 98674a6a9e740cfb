use crate::core::{AggregateSnapshot, SyncEngine, SyncFailure};
use crate::storage::CountStore;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

const ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

pub struct AppState {
    pub engine: SyncEngine,
    pub store: CountStore,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            ALLOWED_ORIGINS
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        ))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            header::USER_AGENT,
        ]);

    Router::new()
        .route("/", get(root))
        .route("/guildCount", get(get_guild_count).post(post_guild_count))
        .route("/services", get(get_services))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct NewGuildCount {
    pub guild_count: i64,
    #[serde(default)]
    pub shard_count: i64,
    pub timestamp: Option<i64>,
}

async fn root() -> Json<Value> {
    Json(envelope(json!({"message": "Hello world!"}), true))
}

async fn get_guild_count(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.store.latest() {
        Ok(Some(entry)) => (StatusCode::OK, Json(envelope(json!(entry), true))),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "No guild count has been recorded yet.",
        ),
        Err(e) => {
            tracing::error!("Failed to read guild count history: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "A server side error has occurred.",
            )
        }
    }
}

/// Persists the new count, then propagates it to every enabled service.
/// The write is all-or-nothing from the client's perspective: any sync
/// failure fails the request, even though services that already accepted
/// the count keep it and the history row stays committed.
async fn post_guild_count(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewGuildCount>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    // Body rejections go through the same envelope as every other error.
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let timestamp = body.timestamp.unwrap_or_else(unix_millis);

    if let Err(e) = state.store.record(body.guild_count, timestamp) {
        tracing::error!("Failed to persist guild count: {}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "A server side error has occurred.",
        );
    }

    let failures = state
        .engine
        .post_all(body.guild_count, body.shard_count)
        .await;
    if !failures.is_empty() {
        return report(&failures);
    }

    (
        StatusCode::OK,
        Json(envelope(
            json!({"guild_count": body.guild_count, "timestamp": timestamp}),
            true,
        )),
    )
}

/// One broken directory fails the whole read rather than returning a
/// partial snapshot.
async fn get_services(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let (snapshots, failures) = state.engine.fetch_all().await;
    if !failures.is_empty() {
        return report(&failures);
    }

    let aggregate = AggregateSnapshot {
        services: snapshots,
        last_updated: unix_millis(),
    };

    (StatusCode::OK, Json(envelope(json!(aggregate), true)))
}

/// Aggregate error report: the failure list under an `errors` key with the
/// success flag down, so clients can tell it apart from any success payload.
fn report(failures: &[SyncFailure]) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(envelope(json!({"errors": failures}), false)),
    )
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(envelope(
            json!({"code": status.as_u16(), "message": message}),
            false,
        )),
    )
}

fn envelope(data: Value, success: bool) -> Value {
    json!({"data": data, "success": success, "nonce": unix_millis()})
}

pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
