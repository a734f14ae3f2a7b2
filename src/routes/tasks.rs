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

/// POST /api/tasks — creates a Task with status=todo, publishes `task:created`.
#[post("/api/tasks", format = "json", data = "<body>")]
pub fn create_task(
    body: Json<CreateTaskRequest>,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
    rate_config: &State<RateLimitConfig>,
    rate_limiter: &State<RateLimiter>,
    ip: ClientIp,
) -> HubResult<Json<Task>> {
    enforce(rate_limiter, "task", &ip.0, rate_config.tasks_max, rate_config.tasks_window_secs)?;

    if body.title.trim().is_empty() || body.creator.trim().is_empty() {
        return Err(HubError::validation("title and creator are required"));
    }

    let task = state.create_task(
        db,
        events,
        &body.room_name,
        &body.title,
        &body.description,
        body.assignee.as_deref(),
        &body.creator,
        body.priority.unwrap_or_default(),
    )?;
    Ok(Json(task))
}

/// GET /api/tasks/<room> — the room's tasks.
#[get("/api/tasks/<room>")]
pub fn list_tasks(room: &str, db: &State<Arc<Db>>, state: &State<Arc<HubState>>) -> HubResult<Json<serde_json::Value>> {
    let tasks = state.list_tasks(db, room)?;
    Ok(Json(serde_json::json!({ "tasks": tasks })))
}

/// POST /api/tasks/<id>/update — merges the partial update, refreshes
/// updatedAt, publishes `task:updated`.
#[post("/api/tasks/<id>/update", format = "json", data = "<body>")]
pub fn update_task(
    id: &str,
    body: Json<UpdateTaskRequest>,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
    rate_config: &State<RateLimitConfig>,
    rate_limiter: &State<RateLimiter>,
    ip: ClientIp,
) -> HubResult<Json<Task>> {
    enforce(rate_limiter, "task", &ip.0, rate_config.tasks_max, rate_config.tasks_window_secs)?;

    let task = state.update_task(db, events, id, body.status, body.assignee.as_deref(), body.priority)?;
    Ok(Json(task))
}
