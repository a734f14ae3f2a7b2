use crate::db::Db;
use crate::error::{HubError, HubResult};
use crate::events::EventBus;
use crate::models::*;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::state::State as HubState;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use std::sync::Arc;

use super::{enforce, ClientIp};

/// POST /api/send — parse mentions, append the message in the sender's
/// current room, create notifications, publish `message`.
#[post("/api/send", format = "json", data = "<body>")]
pub fn send_message(
    body: Json<SendMessageRequest>,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
    rate_config: &State<RateLimitConfig>,
    rate_limiter: &State<RateLimiter>,
    ip: ClientIp,
) -> HubResult<Json<SendMessageResponse>> {
    enforce(rate_limiter, "send", &ip.0, rate_config.messages_max, rate_config.messages_window_secs)?;

    if body.content.trim().is_empty() {
        return Err(HubError::validation("content is required"));
    }

    let msg = state.send(
        db,
        events,
        &body.agent_id,
        &body.content,
        body.metadata.clone().unwrap_or_else(|| serde_json::json!({})),
    )?;
    Ok(Json(SendMessageResponse {
        message_id: msg.id,
        mentions: msg.mentions,
    }))
}

/// GET /api/messages/<room>?since=&limit= — most recent messages,
/// chronological order, post-`since` filter then last `limit`.
#[get("/api/messages/<room>?<since>&<limit>")]
pub fn get_messages(
    room: &str,
    since: Option<&str>,
    limit: Option<&str>,
    state: &State<Arc<HubState>>,
) -> Json<serde_json::Value> {
    // Negative or non-numeric limit falls back to the default; limit=0 is empty.
    let limit = match limit.and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n >= 0 => n,
        _ => 100,
    };
    let messages = state.history(room, since, limit);
    Json(serde_json::json!({ "messages": messages }))
}

/// POST /api/broadcast/<room> — appends a `broadcast` Message with content
/// `"[<from>] <content>"`.
#[post("/api/broadcast/<room>", format = "json", data = "<body>")]
pub fn broadcast_message(
    room: &str,
    body: Json<BroadcastRequest>,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
    rate_config: &State<RateLimitConfig>,
    rate_limiter: &State<RateLimiter>,
    ip: ClientIp,
) -> HubResult<Json<serde_json::Value>> {
    enforce(rate_limiter, "broadcast", &ip.0, rate_config.messages_max, rate_config.messages_window_secs)?;

    if body.content.trim().is_empty() {
        return Err(HubError::validation("content is required"));
    }
    let from = body.from.clone().unwrap_or_else(|| "Op".to_string());
    let msg = state.broadcast(db, events, room, &body.content, &from)?;
    Ok(Json(serde_json::json!({ "success": true, "message": msg })))
}
