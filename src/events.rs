use crate::models::{Message, Notification, Task};
use tokio::sync::broadcast;

/// The three event kinds the push layer fans out, exactly as named in the
/// external interface: `message` (room-scoped), `task` (room-scoped), and
/// `notification` (single-recipient, targeted by agent id rather than room).
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Message(Message),
    Task { created: bool, task: Task },
    Notification { agent_id: String, notification: Notification },
}

impl ChatEvent {
    /// The room a subscriber must be watching to receive this event, if any.
    /// `Notification` is targeted by agent id instead and is filtered by the
    /// subscriber rather than the bus.
    pub fn room(&self) -> Option<&str> {
        match self {
            ChatEvent::Message(m) => Some(&m.room),
            ChatEvent::Task { task, .. } => Some(&task.room),
            ChatEvent::Notification { .. } => None,
        }
    }
}

/// Process-wide pub/sub keyed logically by room name (see `ChatEvent::room`).
/// Request handlers, the Notifier, and the file watcher all publish here;
/// push sessions are the only subscribers. This is the indirection called
/// for in the design notes: nothing couples the API routes directly to a
/// session's socket.
pub struct EventBus {
    sender: broadcast::Sender<ChatEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        EventBus { sender }
    }

    pub fn publish(&self, event: ChatEvent) {
        // A publish failure (no subscribers) is non-fatal per the error design.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }
}
