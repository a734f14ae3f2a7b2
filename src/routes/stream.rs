use crate::db::Db;
use crate::events::{ChatEvent, EventBus};
use crate::models::Message;
use crate::state::State as HubState;
use rocket::response::stream::{Event, EventStream};
use rocket::serde::json::Json;
use rocket::{get, post, State};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};

/// A push session binds one connection to (agentId, room). Per the design
/// notes, this is a session table keyed by session id rather than a socket
/// handle stashed on the Agent record — "connected?" is a derived view over
/// this table, so a stale agent record can never revive a dead socket.
#[derive(Default)]
pub struct PushRegistry {
    sessions: RwLock<HashMap<String, (String, String)>>, // session_id -> (agent_id, room)
}

impl PushRegistry {
    pub fn register(&self, session_id: &str, agent_id: &str, room: &str) {
        self.sessions
            .write()
            .unwrap()
            .insert(session_id.to_string(), (agent_id.to_string(), room.to_string()));
    }

    pub fn unregister(&self, session_id: &str) {
        self.sessions.write().unwrap().remove(session_id);
    }

    pub fn is_connected(&self, agent_id: &str) -> bool {
        self.sessions.read().unwrap().values().any(|(a, _)| a == agent_id)
    }

    /// Fills in the derived `connected` view on a batch of agents fetched
    /// from the store, which always hardcodes it false.
    pub fn mark_connected(&self, agents: &mut [crate::models::Agent]) {
        let sessions = self.sessions.read().unwrap();
        for agent in agents.iter_mut() {
            agent.connected = sessions.values().any(|(a, _)| a == &agent.id);
        }
    }
}

/// RAII: dropped when the SSE stream ends (client disconnect), which clears
/// the push binding within bounded time, as the cancellation model requires.
struct SessionGuard {
    registry: Arc<PushRegistry>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.session_id);
    }
}

/// GET /api/stream?agentId=&room= — the push transport. The single
/// registration frame `register{agentId, room}` is carried as query
/// parameters on connection (SSE has no client-to-server channel once
/// established); the server binds the session and emits `message`/`task`/
/// `notification` events for as long as the connection stays open.
#[get("/api/stream?<agentId>&<room>")]
#[allow(non_snake_case)]
pub fn stream(
    agentId: &str,
    room: &str,
    events: &State<Arc<EventBus>>,
    registry: &State<Arc<PushRegistry>>,
) -> EventStream![] {
    let mut rx = events.subscribe();
    let agent_id = agentId.to_string();
    let room_name = room.to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    registry.register(&session_id, &agent_id, &room_name);
    let guard = SessionGuard {
        registry: (*registry).clone(),
        session_id,
    };

    EventStream! {
        let _guard = guard;
        let mut heartbeat = interval(Duration::from_secs(15));

        loop {
            tokio::select! {
                received = rx.recv() => {
                    match received {
                        Ok(ChatEvent::Message(ref m)) if m.room == room_name => {
                            yield Event::json(m).event("message");
                        }
                        Ok(ChatEvent::Task { created, ref task }) if task.room == room_name => {
                            let kind = if created { "created" } else { "updated" };
                            yield Event::json(&serde_json::json!({"type": kind, "task": task})).event("task");
                        }
                        Ok(ChatEvent::Notification { agent_id: ref recipient, ref notification }) if *recipient == agent_id => {
                            yield Event::json(notification).event("notification");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                        _ => {} // different room/recipient, or lagged
                    }
                }
                _ = heartbeat.tick() => {
                    let now = chrono::Utc::now().to_rfc3339();
                    yield Event::json(&serde_json::json!({"time": now})).event("heartbeat");
                }
            }
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoMessage {
    pub agent_id: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

/// POST /api/stream/message — the thin `message` echo path clients may use
/// instead of `/api/send`; not the primary send path, kept for compatibility
/// with the push protocol's inbound `message` frame.
#[post("/api/stream/message", format = "json", data = "<body>")]
pub fn stream_message(
    body: Json<EchoMessage>,
    db: &State<Arc<Db>>,
    events: &State<Arc<EventBus>>,
    state: &State<Arc<HubState>>,
) -> crate::error::HubResult<Json<Message>> {
    let msg = state.send(
        db,
        events,
        &body.agent_id,
        &body.content,
        body.metadata.clone().unwrap_or_else(|| serde_json::json!({})),
    )?;
    Ok(Json(msg))
}
