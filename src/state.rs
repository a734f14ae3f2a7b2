use crate::db::Db;
use crate::error::{HubError, HubResult};
use crate::events::{ChatEvent, EventBus};
use crate::mentions::parse_mentions;
use crate::models::{
    Agent, AgentStatus, Message, MessageType, Room, RoomSnapshot, RoomSummary, Task, TaskPriority,
    TaskStatus,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

/// Per-room cache: the agent set and message log the concurrency model calls
/// out as shared mutable state requiring one lock per room. Tasks are not
/// cached here — they're loaded lazily per request straight from the Store,
/// but still mutated under this same lock to preserve the room's ordering
/// guarantee across send/broadcast/task/file_change.
struct RoomState {
    room: Room,
    agent_ids: HashSet<String>,
    log: Vec<Message>,
}

/// In-process authoritative model. Hydrated from the Store at boot; every
/// mutation writes through (persist, then mirror in memory, then publish).
pub struct State {
    registry: RwLock<HashMap<String, Mutex<RoomState>>>,
}

impl State {
    /// Hydrates rooms and their message logs from the store. Agents, tasks,
    /// notifications, and memories are intentionally not preloaded.
    pub fn hydrate(db: &Db) -> HubResult<State> {
        let rooms = db.list_active_rooms()?;
        let mut registry = HashMap::new();
        for room in rooms {
            let log = db.list_messages(&room.name, None, i64::MAX)?;
            let agent_ids = db
                .list_agents_in_room(&room.name)?
                .into_iter()
                .map(|a| a.id)
                .collect();
            registry.insert(
                room.name.clone(),
                Mutex::new(RoomState { room, agent_ids, log }),
            );
        }
        Ok(State {
            registry: RwLock::new(registry),
        })
    }

    fn ensure_room(&self, db: &Db, name: &str) -> HubResult<()> {
        if self.registry.read().unwrap().contains_key(name) {
            return Ok(());
        }
        let mut registry = self.registry.write().unwrap();
        if registry.contains_key(name) {
            return Ok(());
        }
        let now = chrono::Utc::now().to_rfc3339();
        let room = db.upsert_room(name, &now, &serde_json::json!({}))?;
        registry.insert(
            name.to_string(),
            Mutex::new(RoomState {
                room,
                agent_ids: HashSet::new(),
                log: Vec::new(),
            }),
        );
        Ok(())
    }

    // -------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------

    /// Idempotent on repeat with the same (agentId, roomName): rejoining
    /// refreshes `lastActive`/capabilities and does not duplicate the
    /// "joined" system message.
    pub fn join(
        &self,
        db: &Db,
        events: &EventBus,
        room_name: &str,
        agent_id: &str,
        agent_name: &str,
        capabilities: serde_json::Value,
    ) -> HubResult<RoomSnapshot> {
        self.ensure_room(db, room_name)?;
        let now = chrono::Utc::now().to_rfc3339();

        let previous = db.get_agent(agent_id)?;
        let already_present = previous.as_ref().map(|a| a.room.as_deref() == Some(room_name)).unwrap_or(false);

        let agent = Agent {
            id: agent_id.to_string(),
            name: agent_name.to_string(),
            room: Some(room_name.to_string()),
            capabilities,
            joined_at: previous
                .as_ref()
                .map(|a| a.joined_at.clone())
                .unwrap_or_else(|| now.clone()),
            last_active: now.clone(),
            status: AgentStatus::Online,
            // filled in by PushRegistry::mark_connected at the route layer
            connected: false,
        };
        db.upsert_agent(&agent)?;

        // Switching rooms must evict the agent from its previous room's
        // in-memory set, or that room's agentCount stays permanently inflated.
        if let Some(prev_room) = previous.and_then(|a| a.room) {
            if prev_room != room_name {
                let registry = self.registry.read().unwrap();
                if let Some(prev_lock) = registry.get(&prev_room) {
                    prev_lock.lock().unwrap().agent_ids.remove(agent_id);
                }
            }
        }

        let registry = self.registry.read().unwrap();
        let mut room_state = registry.get(room_name).unwrap().lock().unwrap();
        room_state.agent_ids.insert(agent_id.to_string());

        if !already_present {
            let system_msg = self.append_locked(
                db,
                &mut room_state,
                None,
                "System",
                format!("{agent_name} joined"),
                MessageType::System,
                serde_json::json!({}),
            )?;
            events.publish(ChatEvent::Message(system_msg));
        }

        let roster = db.list_agents_in_room(room_name)?;
        Ok(RoomSnapshot {
            room: room_state.room.clone(),
            roster,
        })
    }

    /// Not-found if the agent doesn't exist. Per the resolved open question,
    /// leaving deletes the agent row rather than marking it offline (see DESIGN.md).
    pub fn leave(&self, db: &Db, events: &EventBus, agent_id: &str) -> HubResult<()> {
        let agent = db
            .get_agent(agent_id)?
            .ok_or_else(|| HubError::not_found(format!("agent {agent_id} not found")))?;
        let Some(room_name) = agent.room.clone() else {
            db.delete_agent(agent_id)?;
            return Ok(());
        };

        db.delete_agent(agent_id)?;

        let registry = self.registry.read().unwrap();
        if let Some(room_lock) = registry.get(&room_name) {
            let mut room_state = room_lock.lock().unwrap();
            room_state.agent_ids.remove(agent_id);
            let system_msg = self.append_locked(
                db,
                &mut room_state,
                None,
                "System",
                format!("{} left", agent.name),
                MessageType::System,
                serde_json::json!({}),
            )?;
            events.publish(ChatEvent::Message(system_msg));
        }
        Ok(())
    }

    // -------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------

    /// Parses mentions, appends the message in the sender's current room,
    /// triggers the Notifier, and publishes the `message` event. Invariant:
    /// appending increases the room's log length by exactly one and refreshes
    /// the sender's `lastActive`.
    pub fn send(
        &self,
        db: &Db,
        events: &EventBus,
        agent_id: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> HubResult<Message> {
        let mut agent = db
            .get_agent(agent_id)?
            .ok_or_else(|| HubError::not_found(format!("agent {agent_id} not found")))?;
        let room_name = agent
            .room
            .clone()
            .ok_or_else(|| HubError::validation("agent is not in a room"))?;

        let registry = self.registry.read().unwrap();
        let room_lock = registry
            .get(&room_name)
            .ok_or_else(|| HubError::not_found(format!("room {room_name} not found")))?;
        let mut room_state = room_lock.lock().unwrap();

        let msg = self.append_locked(
            db,
            &mut room_state,
            Some(agent_id.to_string()),
            &agent.name.clone(),
            content.to_string(),
            MessageType::Message,
            metadata,
        )?;

        agent.last_active = msg.timestamp.clone();
        db.upsert_agent(&agent)?;

        crate::notifier::notify(db, events, &msg);
        events.publish(ChatEvent::Message(msg.clone()));
        Ok(msg)
    }

    /// Appends a `broadcast` Message with content `"[<from>] <content>"`.
    pub fn broadcast(
        &self,
        db: &Db,
        events: &EventBus,
        room_name: &str,
        content: &str,
        from: &str,
    ) -> HubResult<Message> {
        self.ensure_room(db, room_name)?;
        let registry = self.registry.read().unwrap();
        let room_lock = registry.get(room_name).unwrap();
        let mut room_state = room_lock.lock().unwrap();

        let msg = self.append_locked(
            db,
            &mut room_state,
            None,
            from,
            format!("[{from}] {content}"),
            MessageType::Broadcast,
            serde_json::json!({}),
        )?;
        events.publish(ChatEvent::Message(msg.clone()));
        Ok(msg)
    }

    /// Appends a synthetic `file_change` message on behalf of the file
    /// watcher. Called once per active room per filesystem event.
    pub fn append_file_change(
        &self,
        db: &Db,
        events: &EventBus,
        room_name: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> HubResult<()> {
        let registry = self.registry.read().unwrap();
        let Some(room_lock) = registry.get(room_name) else {
            return Ok(());
        };
        let mut room_state = room_lock.lock().unwrap();
        let msg = self.append_locked(
            db,
            &mut room_state,
            None,
            "System",
            content.to_string(),
            MessageType::FileChange,
            metadata,
        )?;
        events.publish(ChatEvent::Message(msg));
        Ok(())
    }

    fn append_locked(
        &self,
        db: &Db,
        room_state: &mut RoomState,
        agent_id: Option<String>,
        agent_name: &str,
        content: String,
        kind: MessageType,
        metadata: serde_json::Value,
    ) -> HubResult<Message> {
        let mentions = parse_mentions(&content);
        let msg = Message {
            id: uuid::Uuid::new_v4().to_string(),
            room: room_state.room.name.clone(),
            agent_id,
            agent_name: agent_name.to_string(),
            content,
            kind,
            mentions,
            metadata,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        db.insert_message(&msg)?;
        room_state.log.push(msg.clone());
        Ok(msg)
    }

    /// Most recent messages in the room (post-`since` filter, then take last
    /// `limit`), returned oldest-first.
    pub fn history(&self, room_name: &str, since: Option<&str>, limit: i64) -> Vec<Message> {
        let registry = self.registry.read().unwrap();
        let Some(room_lock) = registry.get(room_name) else {
            return Vec::new();
        };
        let room_state = room_lock.lock().unwrap();
        let filtered: Vec<&Message> = room_state
            .log
            .iter()
            .filter(|m| since.is_none_or(|s| m.timestamp.as_str() > s))
            .collect();
        let limit = limit.max(0) as usize;
        let start = filtered.len().saturating_sub(limit);
        filtered[start..].iter().map(|m| (*m).clone()).collect()
    }

    pub fn list_rooms(&self, db: &Db) -> HubResult<Vec<RoomSummary>> {
        let names: Vec<String> = self.registry.read().unwrap().keys().cloned().collect();
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let agents = db.list_agents_in_room(&name)?;
            let created_at = {
                let registry = self.registry.read().unwrap();
                registry.get(&name).unwrap().lock().unwrap().room.created_at.clone()
            };
            out.push(RoomSummary {
                agent_count: agents.len(),
                agents,
                name,
                created_at,
            });
        }
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    pub fn room_exists(&self, name: &str) -> bool {
        self.registry.read().unwrap().contains_key(name)
    }

    pub fn agent_count(&self, room_name: &str) -> usize {
        let registry = self.registry.read().unwrap();
        registry
            .get(room_name)
            .map(|r| r.lock().unwrap().agent_ids.len())
            .unwrap_or(0)
    }

    pub fn active_room_names(&self) -> Vec<String> {
        self.registry.read().unwrap().keys().cloned().collect()
    }

    // -------------------------------------------------------------
    // Tasks — loaded lazily per request, mutated under the room lock to
    // preserve the ordering discipline even though no in-memory cache exists.
    // -------------------------------------------------------------

    pub fn create_task(
        &self,
        db: &Db,
        events: &EventBus,
        room_name: &str,
        title: &str,
        description: &str,
        assignee: Option<&str>,
        creator: &str,
        priority: TaskPriority,
    ) -> HubResult<Task> {
        self.ensure_room(db, room_name)?;
        let registry = self.registry.read().unwrap();
        let room_lock = registry.get(room_name).unwrap();
        let _guard = room_lock.lock().unwrap();

        let now = chrono::Utc::now().to_rfc3339();
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            room: room_name.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            assignee: assignee.map(|s| s.to_string()),
            creator: creator.to_string(),
            priority,
            status: TaskStatus::Todo,
            created_at: now.clone(),
            updated_at: now,
        };
        db.insert_task(&task)?;
        events.publish(ChatEvent::Task { created: true, task: task.clone() });
        Ok(task)
    }

    pub fn update_task(
        &self,
        db: &Db,
        events: &EventBus,
        task_id: &str,
        status: Option<TaskStatus>,
        assignee: Option<&str>,
        priority: Option<TaskPriority>,
    ) -> HubResult<Task> {
        let existing = db
            .get_task(task_id)?
            .ok_or_else(|| HubError::not_found(format!("task {task_id} not found")))?;

        let registry = self.registry.read().unwrap();
        let _guard = registry.get(&existing.room).map(|l| l.lock().unwrap());

        let now = chrono::Utc::now().to_rfc3339();
        let task = db
            .update_task(task_id, status, assignee, priority, &now)?
            .ok_or_else(|| HubError::not_found(format!("task {task_id} not found")))?;
        events.publish(ChatEvent::Task { created: false, task: task.clone() });
        Ok(task)
    }

    pub fn list_tasks(&self, db: &Db, room_name: &str) -> HubResult<Vec<Task>> {
        db.list_tasks(room_name)
    }
}
