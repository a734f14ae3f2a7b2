use crate::db::Db;
use crate::error::HubResult;
use crate::models::*;
use crate::notifier;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use std::sync::Arc;

/// GET /api/notifications/<agent_id>?unreadOnly= — up to 50, newest first.
#[get("/api/notifications/<agent_id>?<unreadOnly>")]
#[allow(non_snake_case)]
pub fn get_notifications(
    agent_id: &str,
    unreadOnly: Option<bool>,
    db: &State<Arc<Db>>,
) -> HubResult<Json<serde_json::Value>> {
    let notifications = db.list_notifications(agent_id, unreadOnly.unwrap_or(false))?;
    Ok(Json(serde_json::json!({ "notifications": notifications })))
}

/// POST /api/notifications/<id>/read — idempotent; reports whether the row changed.
#[post("/api/notifications/<id>/read")]
pub fn mark_notification_read(id: &str, db: &State<Arc<Db>>) -> HubResult<Json<MarkReadResponse>> {
    let updated = notifier::mark_read(db, id)?;
    Ok(Json(MarkReadResponse { updated }))
}
