use crate::db::Db;
use crate::events::EventBus;
use crate::state::State;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Ignore any path whose any component begins with `.`.
fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
    })
}

fn action_for(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("add"),
        EventKind::Modify(_) => Some("change"),
        EventKind::Remove(_) => Some("delete"),
        _ => None,
    }
}

/// Starts a single process-wide watcher over the shared directory root.
/// Per the design notes, this replaces the source's one-watcher-per-room
/// scheme: the filesystem is watched exactly once, and each currently-active
/// room receives its own synthetic `file_change` message for every event —
/// so log growth stays proportional to events, not events × rooms.
///
/// The returned `RecommendedWatcher` must be kept alive for the lifetime of
/// the process; dropping it stops the watch.
pub fn spawn_watcher(
    root: std::path::PathBuf,
    db: Arc<Db>,
    state: Arc<State>,
    events: Arc<EventBus>,
) -> notify::Result<RecommendedWatcher> {
    let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| {
            let _ = tx.send(result);
        },
        Config::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    let watch_root = root.clone();
    tokio::spawn(async move {
        while let Some(result) = rx.recv().await {
            let event = match result {
                Ok(e) => e,
                Err(e) => {
                    eprintln!("⚠️  file watcher error: {e}");
                    continue;
                }
            };
            let Some(action) = action_for(&event.kind) else {
                continue;
            };
            for path in &event.paths {
                if is_hidden(path) {
                    continue;
                }
                let rel = path
                    .strip_prefix(&watch_root)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .into_owned();
                if rel.is_empty() {
                    continue;
                }
                let content = match action {
                    "add" => format!("File created: {rel}"),
                    "delete" => format!("File deleted: {rel}"),
                    _ => format!("File changed: {rel}"),
                };
                let metadata = serde_json::json!({ "filePath": rel, "action": action });

                for room_name in state.active_room_names() {
                    if let Err(e) =
                        state.append_file_change(&db, &events, &room_name, &content, metadata.clone())
                    {
                        eprintln!("⚠️  file watcher: failed to append to room {room_name}: {e}");
                    }
                }
            }
        }
    });

    Ok(watcher)
}
