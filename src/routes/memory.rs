use crate::db::Db;
use crate::error::{HubError, HubResult};
use crate::models::*;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use rocket::serde::json::Json;
use rocket::{get, post, State};
use std::sync::Arc;

use super::{enforce, ClientIp};

/// POST /api/memory/<agent_id> — persists an entry; expiresAt = now+expiresIn
/// when given.
#[post("/api/memory/<agent_id>", format = "json", data = "<body>")]
pub fn store_memory(
    agent_id: &str,
    body: Json<StoreMemoryRequest>,
    db: &State<Arc<Db>>,
    rate_config: &State<RateLimitConfig>,
    rate_limiter: &State<RateLimiter>,
    ip: ClientIp,
) -> HubResult<Json<MemoryEntry>> {
    enforce(rate_limiter, "memory", &ip.0, rate_config.memory_max, rate_config.memory_window_secs)?;

    if body.key.trim().is_empty() {
        return Err(HubError::validation("key is required"));
    }

    let now = chrono::Utc::now();
    let expires_at = body
        .expires_in
        .map(|secs| (now + chrono::Duration::seconds(secs)).to_rfc3339());

    let entry = MemoryEntry {
        id: uuid::Uuid::new_v4().to_string(),
        agent_id: agent_id.to_string(),
        room: db.get_agent(agent_id)?.and_then(|a| a.room),
        key: body.key.clone(),
        value: body.value.clone(),
        kind: body.kind.clone().unwrap_or_else(|| "note".to_string()),
        created_at: now.to_rfc3339(),
        expires_at,
    };
    db.insert_memory(&entry)?;
    Ok(Json(entry))
}

/// GET /api/memory/<agent_id>?key=&type= — active (unexpired) entries, newest first.
#[get("/api/memory/<agent_id>?<key>&<r#type>")]
pub fn get_memory(
    agent_id: &str,
    key: Option<&str>,
    r#type: Option<&str>,
    db: &State<Arc<Db>>,
) -> HubResult<Json<serde_json::Value>> {
    let now = chrono::Utc::now().to_rfc3339();
    let entries = db.list_memory(agent_id, key, r#type, &now)?;
    Ok(Json(serde_json::json!({ "memories": entries })))
}
