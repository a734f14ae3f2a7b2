use crate::db::Db;
use crate::error::{HubError, HubResult};
use crate::events::EventBus;
use crate::models::*;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::routes::stream::PushRegistry;

use crate::state::State as HubState;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use std::sync::Arc;

use super::{enforce, ClientIp};

/// POST /api/join/<room> — upsert room, add agent, append a `system` "joined"
/// message. Idempotent on repeat with the same (agentId, roomName).
#[post("/api/join/<room>", format = "json", data = "<body>")]
pub fn join_room(
    room: &str,
    body: Json<JoinRequest>,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
    push: &State<Arc<PushRegistry>>,
    rate_config: &State<RateLimitConfig>,
    rate_limiter: &State<RateLimiter>,
    ip: ClientIp,
) -> HubResult<Json<RoomSnapshot>> {
    enforce(rate_limiter, "join", &ip.0, rate_config.rooms_max, rate_config.rooms_window_secs)?;

    if body.agent_id.trim().is_empty() || body.agent_name.trim().is_empty() {
        return Err(HubError::validation("agentId and agentName are required"));
    }

    let mut snapshot = state.join(
        db,
        events,
        room,
        body.agent_id.trim(),
        body.agent_name.trim(),
        body.capabilities.clone().unwrap_or_else(|| serde_json::json!({})),
    )?;
    push.mark_connected(&mut snapshot.roster);
    Ok(Json(snapshot))
}

/// POST /api/leave/<agent_id> — removes the agent from its room; not-found if
/// the agent doesn't exist.
#[post("/api/leave/<agent_id>")]
pub fn leave_room(
    agent_id: &str,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
) -> HubResult<Json<serde_json::Value>> {
    state.leave(db, events, agent_id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /api/rooms — name, agentCount, agents[], createdAt per active room.
#[get("/api/rooms")]
pub fn list_rooms(
    db: &State<Arc<Db>>,
    state: &State<Arc<HubState>>,
    push: &State<Arc<PushRegistry>>,
) -> HubResult<Json<serde_json::Value>> {
    let mut rooms = state.list_rooms(db)?;
    for room in rooms.iter_mut() {
        push.mark_connected(&mut room.agents);
    }
    Ok(Json(serde_json::json!({ "rooms": rooms })))
}

/// GET /api/agents/<room> — agents currently in the room.
#[get("/api/agents/<room>")]
pub fn list_agents(
    room: &str,
    db: &State<Arc<Db>>,
    push: &State<Arc<PushRegistry>>,
) -> HubResult<Json<serde_json::Value>> {
    let mut agents = db.list_agents_in_room(room)?;
    push.mark_connected(&mut agents);
    Ok(Json(serde_json::json!({ "agents": agents })))
}
