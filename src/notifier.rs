use crate::db::Db;
use crate::events::{ChatEvent, EventBus};
use crate::models::{Message, Notification};

const PREFIX_LEN: usize = 100;

/// Given a just-persisted message and its mentions, persist a Notification
/// for every resolved recipient and push it best-effort. Unresolved names
/// (no agent with that name anywhere) are silently dropped; a name mentioned
/// twice in one message still yields exactly one notification.
pub fn notify(db: &Db, events: &EventBus, msg: &Message) {
    if msg.mentions.is_empty() {
        return;
    }

    let mut seen = std::collections::HashSet::new();
    let prefix: String = msg.content.chars().take(PREFIX_LEN).collect();
    let text = format!("{} mentioned you: {}…", msg.agent_name, prefix);
    let now = chrono::Utc::now().to_rfc3339();

    for name in &msg.mentions {
        if !seen.insert(name.clone()) {
            continue;
        }
        let Ok(Some(recipient)) = db.find_agent_by_name(&msg.room, name) else {
            continue;
        };

        let notification = Notification {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: recipient.id.clone(),
            room: msg.room.clone(),
            message: text.clone(),
            kind: "mention".to_string(),
            is_read: false,
            created_at: now.clone(),
        };

        if let Err(e) = db.insert_notification(&notification) {
            eprintln!("⚠️  notifier: failed to persist notification for {}: {e}", recipient.id);
            continue;
        }

        events.publish(ChatEvent::Notification {
            agent_id: recipient.id,
            notification,
        });
    }
}

/// Idempotent: returns whether the row's `isRead` flag actually flipped.
pub fn mark_read(db: &Db, id: &str) -> crate::error::HubResult<bool> {
    db.mark_notification_read(id)
}
