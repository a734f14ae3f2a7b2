use crate::error::{HubError, HubResult};
use crate::models::{
    Agent, AgentStatus, MemoryEntry, Message, MessageType, Notification, Room, Task, TaskPriority,
    TaskStatus,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

/// Durable backing store for rooms, agents, messages, tasks, memories, and
/// notifications. One connection, serialized behind a mutex — rusqlite
/// connections are not `Sync`, and the write volume expected here does not
/// warrant a connection pool.
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn new(path: &std::path::Path) -> Self {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path).expect("failed to open database");
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .expect("failed to set pragmas");
        let db = Db {
            conn: Mutex::new(conn),
        };
        db.migrate();
        db
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn migrate(&self) {
        let conn = self.conn();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS rooms (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                settings TEXT NOT NULL DEFAULT '{}'
            );

            CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                room TEXT,
                capabilities TEXT NOT NULL DEFAULT '{}',
                joined_at TEXT NOT NULL,
                last_active TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'online'
            );
            CREATE INDEX IF NOT EXISTS idx_agents_room ON agents(room);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL,
                room TEXT NOT NULL,
                agent_id TEXT,
                agent_name TEXT NOT NULL,
                content TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT 'message',
                mentions TEXT NOT NULL DEFAULT '[]',
                metadata TEXT NOT NULL DEFAULT '{}',
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_room_seq ON messages(room, seq);

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                room TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                assignee TEXT,
                creator TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'todo',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_room ON tasks(room);

            CREATE TABLE IF NOT EXISTS agent_memory (
                id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL,
                room TEXT,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT 'note',
                created_at TEXT NOT NULL,
                expires_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_memory_agent ON agent_memory(agent_id);

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                agent_id TEXT NOT NULL,
                room TEXT NOT NULL,
                message TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT 'mention',
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notifications_agent ON notifications(agent_id, created_at);
            ",
        )
        .expect("failed to run migrations");
    }

    /// Next value for the global monotonic message sequence, used for
    /// reliable `since`/pagination ordering independent of timestamp ties.
    fn next_seq(conn: &Connection) -> i64 {
        conn.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM messages", [], |r| r.get(0))
            .unwrap_or(1)
    }

    // -------------------------------------------------------------
    // Rooms
    // -------------------------------------------------------------

    pub fn upsert_room(&self, name: &str, created_at: &str, settings: &serde_json::Value) -> HubResult<Room> {
        let conn = self.conn();
        let settings_str = settings.to_string();
        conn.execute(
            "INSERT INTO rooms (name, created_at, is_active, settings) VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(name) DO NOTHING",
            params![name, created_at, settings_str],
        )?;
        self.get_room_locked(&conn, name)?.ok_or_else(|| HubError::store("room vanished after insert"))
    }

    pub fn get_room(&self, name: &str) -> HubResult<Option<Room>> {
        let conn = self.conn();
        self.get_room_locked(&conn, name)
    }

    fn get_room_locked(&self, conn: &Connection, name: &str) -> HubResult<Option<Room>> {
        conn.query_row(
            "SELECT name, created_at, is_active, settings FROM rooms WHERE name = ?1",
            params![name],
            row_to_room,
        )
        .optional()
        .map_err(HubError::from)
    }

    pub fn list_active_rooms(&self) -> HubResult<Vec<Room>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT name, created_at, is_active, settings FROM rooms WHERE is_active = 1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_room)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_rooms(&self) -> HubResult<i64> {
        let conn = self.conn();
        Ok(conn.query_row("SELECT COUNT(*) FROM rooms WHERE is_active = 1", [], |r| r.get(0))?)
    }

    pub fn count_messages(&self, room: &str) -> HubResult<i64> {
        let conn = self.conn();
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE room = ?1",
            params![room],
            |r| r.get(0),
        )?)
    }

    pub fn count_tasks(&self) -> HubResult<i64> {
        let conn = self.conn();
        Ok(conn.query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0))?)
    }

    // -------------------------------------------------------------
    // Agents
    // -------------------------------------------------------------

    pub fn upsert_agent(&self, agent: &Agent) -> HubResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO agents (id, name, room, capabilities, joined_at, last_active, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               name = ?2, room = ?3, capabilities = ?4, last_active = ?6, status = ?7",
            params![
                agent.id,
                agent.name,
                agent.room,
                agent.capabilities.to_string(),
                agent.joined_at,
                agent.last_active,
                agent.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn get_agent(&self, id: &str) -> HubResult<Option<Agent>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, room, capabilities, joined_at, last_active, status FROM agents WHERE id = ?1",
            params![id],
            row_to_agent,
        )
        .optional()
        .map_err(HubError::from)
    }

    pub fn delete_agent(&self, id: &str) -> HubResult<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM agents WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn list_agents_in_room(&self, room: &str) -> HubResult<Vec<Agent>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, room, capabilities, joined_at, last_active, status FROM agents
             WHERE room = ?1 ORDER BY joined_at ASC",
        )?;
        let rows = stmt.query_map(params![room], row_to_agent)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn find_agent_by_name(&self, room: &str, name: &str) -> HubResult<Option<Agent>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, room, capabilities, joined_at, last_active, status FROM agents
             WHERE room = ?1 AND name = ?2 LIMIT 1",
            params![room, name],
            row_to_agent,
        )
        .optional()
        .map_err(HubError::from)
    }

    pub fn count_all_agents(&self) -> HubResult<usize> {
        let conn = self.conn();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM agents", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    // -------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------

    pub fn insert_message(&self, msg: &Message) -> HubResult<()> {
        let conn = self.conn();
        let seq = Self::next_seq(&conn);
        conn.execute(
            "INSERT INTO messages (id, seq, room, agent_id, agent_name, content, type, mentions, metadata, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                msg.id,
                seq,
                msg.room,
                msg.agent_id,
                msg.agent_name,
                msg.content,
                msg.kind.as_str(),
                serde_json::to_string(&msg.mentions).unwrap_or_else(|_| "[]".to_string()),
                msg.metadata.to_string(),
                msg.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Most recent messages for `room`, optionally filtered to `timestamp > since`,
    /// capped at `limit`, returned oldest-first (matching history's chronological contract).
    pub fn list_messages(&self, room: &str, since: Option<&str>, limit: i64) -> HubResult<Vec<Message>> {
        let conn = self.conn();
        let (sql, newest_first): (&str, bool) = (
            "SELECT id, room, agent_id, agent_name, content, type, mentions, metadata, timestamp
             FROM messages WHERE room = ?1 AND (?2 IS NULL OR timestamp > ?2)
             ORDER BY seq DESC LIMIT ?3",
            true,
        );
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![room, since, limit], row_to_message)?;
        let mut messages: Vec<Message> = rows.filter_map(|r| r.ok()).collect();
        if newest_first {
            messages.reverse();
        }
        Ok(messages)
    }

    // -------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------

    pub fn insert_task(&self, task: &Task) -> HubResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tasks (id, room, title, description, assignee, creator, priority, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.id,
                task.room,
                task.title,
                task.description,
                task.assignee,
                task.creator,
                task.priority.as_str(),
                task.status.as_str(),
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> HubResult<Option<Task>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, room, title, description, assignee, creator, priority, status, created_at, updated_at
             FROM tasks WHERE id = ?1",
            params![id],
            row_to_task,
        )
        .optional()
        .map_err(HubError::from)
    }

    pub fn update_task(
        &self,
        id: &str,
        status: Option<TaskStatus>,
        assignee: Option<&str>,
        priority: Option<TaskPriority>,
        updated_at: &str,
    ) -> HubResult<Option<Task>> {
        let conn = self.conn();
        let existing = conn
            .query_row(
                "SELECT id, room, title, description, assignee, creator, priority, status, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .optional()?;
        let Some(mut task) = existing else {
            return Ok(None);
        };
        if let Some(s) = status {
            task.status = s;
        }
        if let Some(a) = assignee {
            task.assignee = Some(a.to_string());
        }
        if let Some(p) = priority {
            task.priority = p;
        }
        task.updated_at = updated_at.to_string();

        conn.execute(
            "UPDATE tasks SET status = ?2, assignee = ?3, priority = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                task.id,
                task.status.as_str(),
                task.assignee,
                task.priority.as_str(),
                task.updated_at,
            ],
        )?;
        Ok(Some(task))
    }

    pub fn list_tasks(&self, room: &str) -> HubResult<Vec<Task>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, room, title, description, assignee, creator, priority, status, created_at, updated_at
             FROM tasks WHERE room = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![room], row_to_task)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // -------------------------------------------------------------
    // Agent memory
    // -------------------------------------------------------------

    pub fn insert_memory(&self, entry: &MemoryEntry) -> HubResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO agent_memory (id, agent_id, room, key, value, type, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                entry.agent_id,
                entry.room,
                entry.key,
                entry.value,
                entry.kind,
                entry.created_at,
                entry.expires_at,
            ],
        )?;
        Ok(())
    }

    /// Unexpired memories for `agent_id`, optionally filtered by `key`/`type`, newest first.
    pub fn list_memory(
        &self,
        agent_id: &str,
        key: Option<&str>,
        kind: Option<&str>,
        now: &str,
    ) -> HubResult<Vec<MemoryEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, room, key, value, type, created_at, expires_at FROM agent_memory
             WHERE agent_id = ?1
               AND (expires_at IS NULL OR expires_at > ?2)
               AND (?3 IS NULL OR key = ?3)
               AND (?4 IS NULL OR type = ?4)
             ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map(params![agent_id, now, key, kind], row_to_memory)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // -------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------

    pub fn insert_notification(&self, n: &Notification) -> HubResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO notifications (id, agent_id, room, message, type, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![n.id, n.agent_id, n.room, n.message, n.kind, n.is_read as i64, n.created_at],
        )?;
        Ok(())
    }

    pub fn list_notifications(&self, agent_id: &str, unread_only: bool) -> HubResult<Vec<Notification>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, agent_id, room, message, type, is_read, created_at FROM notifications
             WHERE agent_id = ?1 AND (?2 = 0 OR is_read = 0)
             ORDER BY created_at DESC LIMIT 50",
        )?;
        let rows = stmt.query_map(params![agent_id, unread_only as i64], row_to_notification)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Returns whether the row's `is_read` flag actually changed (idempotency contract).
    pub fn mark_notification_read(&self, id: &str) -> HubResult<bool> {
        let conn = self.conn();
        let was_read: Option<bool> = conn
            .query_row(
                "SELECT is_read FROM notifications WHERE id = ?1",
                params![id],
                |r| r.get::<_, i64>(0).map(|v| v != 0),
            )
            .optional()?;
        let Some(was_read) = was_read else {
            return Err(HubError::not_found("notification not found"));
        };
        if was_read {
            return Ok(false);
        }
        conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", params![id])?;
        Ok(true)
    }
}

fn row_to_room(row: &rusqlite::Row) -> rusqlite::Result<Room> {
    let settings_str: String = row.get(3)?;
    Ok(Room {
        name: row.get(0)?,
        created_at: row.get(1)?,
        is_active: row.get::<_, i64>(2)? != 0,
        settings: serde_json::from_str(&settings_str).unwrap_or_else(|_| serde_json::json!({})),
    })
}

fn row_to_agent(row: &rusqlite::Row) -> rusqlite::Result<Agent> {
    let capabilities_str: String = row.get(3)?;
    let status_str: String = row.get(6)?;
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        room: row.get(2)?,
        capabilities: serde_json::from_str(&capabilities_str).unwrap_or_else(|_| serde_json::json!({})),
        joined_at: row.get(4)?,
        last_active: row.get(5)?,
        status: AgentStatus::parse(&status_str),
        // filled in by PushRegistry::mark_connected at the route layer
        connected: false,
    })
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let type_str: String = row.get(5)?;
    let mentions_str: String = row.get(6)?;
    let metadata_str: String = row.get(7)?;
    Ok(Message {
        id: row.get(0)?,
        room: row.get(1)?,
        agent_id: row.get(2)?,
        agent_name: row.get(3)?,
        content: row.get(4)?,
        kind: MessageType::from_str(&type_str),
        mentions: serde_json::from_str(&mentions_str).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata_str).unwrap_or_else(|_| serde_json::json!({})),
        timestamp: row.get(8)?,
    })
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let priority_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        room: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        assignee: row.get(4)?,
        creator: row.get(5)?,
        priority: TaskPriority::parse(&priority_str).unwrap_or(TaskPriority::Medium),
        status: TaskStatus::parse(&status_str).unwrap_or(TaskStatus::Todo),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_memory(row: &rusqlite::Row) -> rusqlite::Result<MemoryEntry> {
    Ok(MemoryEntry {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        room: row.get(2)?,
        key: row.get(3)?,
        value: row.get(4)?,
        kind: row.get(5)?,
        created_at: row.get(6)?,
        expires_at: row.get(7)?,
    })
}

fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        room: row.get(2)?,
        message: row.get(3)?,
        kind: row.get(4)?,
        is_read: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}
