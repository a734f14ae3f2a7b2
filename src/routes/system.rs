use crate::config::Config;
use crate::db::Db;
use crate::error::HubResult;
use crate::models::{RoomStat, Stats};
use crate::state::State as HubState;
use rocket::serde::json::Json;
use rocket::{get, State};
use std::sync::Arc;

#[get("/api/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/stats — totalRooms, totalAgents, totalTasks, sharedDirectory,
/// per-room `{name, agentCount, messageCount, isActive}`.
#[get("/api/stats")]
pub fn stats(db: &State<Arc<Db>>, state: &State<Arc<HubState>>, config: &State<Config>) -> HubResult<Json<Stats>> {
    let total_rooms = db.count_rooms()?;
    let total_agents = db.count_all_agents()?;
    let total_tasks = db.count_tasks()?;

    let mut rooms = Vec::new();
    for name in state.active_room_names() {
        let message_count = db.count_messages(&name)?;
        rooms.push(RoomStat {
            agent_count: state.agent_count(&name),
            message_count,
            is_active: true,
            name,
        });
    }
    rooms.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(Stats {
        total_rooms,
        total_agents,
        total_tasks,
        shared_directory: config.shared_dir.display().to_string(),
        rooms,
    }))
}
