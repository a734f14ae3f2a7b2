pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod mentions;
pub mod models;
pub mod notifier;
pub mod rate_limit;
pub mod routes;
pub mod shared_fs;
pub mod state;
pub mod watcher;

use config::Config;
use db::Db;
use events::EventBus;
use rate_limit::{RateLimitConfig, RateLimiter};
use rocket_cors::CorsOptions;
use routes::PushRegistry;
use shared_fs::SharedFs;
use state::State as HubState;
use std::sync::Arc;

/// Builds the hub's Rocket instance using `Config::from_env()`. This is the
/// entry point `main.rs`/tests call.
pub fn rocket() -> rocket::Rocket<rocket::Build> {
    let config = Config::from_env();
    build_rocket(config, RateLimitConfig::from_env())
}

/// Test entry point: builds the hub against an explicit data/shared
/// directory pair instead of reading the environment, so tests can isolate
/// their own temp directories.
pub fn rocket_with_dirs(data_dir: &std::path::Path, shared_dir: &std::path::Path) -> rocket::Rocket<rocket::Build> {
    let config = Config {
        port: 0,
        shared_dir: shared_dir.to_path_buf(),
        data_dir: data_dir.to_path_buf(),
        log_level: config::LogLevel::Info,
    };
    build_rocket(config, RateLimitConfig::default())
}

/// Test entry point: like `rocket_with_dirs`, but lets a test install its own
/// `RateLimitConfig` instead of the env-derived default.
pub fn rocket_with_dirs_and_limits(
    data_dir: &std::path::Path,
    shared_dir: &std::path::Path,
    rate_limit_config: RateLimitConfig,
) -> rocket::Rocket<rocket::Build> {
    let config = Config {
        port: 0,
        shared_dir: shared_dir.to_path_buf(),
        data_dir: data_dir.to_path_buf(),
        log_level: config::LogLevel::Info,
    };
    build_rocket(config, rate_limit_config)
}

fn build_rocket(config: Config, rate_limit_config: RateLimitConfig) -> rocket::Rocket<rocket::Build> {
    std::fs::create_dir_all(&config.data_dir).ok();

    let db = Arc::new(Db::new(&config.db_path()));
    let events = Arc::new(EventBus::new());
    let state = Arc::new(HubState::hydrate(&db).expect("failed to hydrate state from store"));
    let shared_fs = Arc::new(SharedFs::new(&config.shared_dir).expect("failed to initialize shared directory"));
    let push_registry = Arc::new(PushRegistry::default());
    let rate_limiter = RateLimiter::new();

    // The file watcher owns its OS watch handle for the process lifetime —
    // there is no room-scoped teardown in this release (documented open issue
    // in the original design: watchers are never released before process exit).
    let watcher = watcher::spawn_watcher(shared_fs.root().to_path_buf(), db.clone(), state.clone(), events.clone())
        .map_err(|e| eprintln!("⚠️  file watcher failed to start: {e}"))
        .ok();
    std::mem::forget(watcher);

    let cors = CorsOptions::default().to_cors().expect("failed to build CORS");

    let figment = rocket::Config::figment().merge(("port", config.port));

    rocket::custom(figment)
        .manage(config)
        .manage(db)
        .manage(events)
        .manage(state)
        .manage(shared_fs)
        .manage(push_registry)
        .manage(rate_limit_config)
        .manage(rate_limiter)
        .attach(cors)
        .register("/", rocket::catchers![routes::too_many_requests, routes::not_found])
        .mount(
            "/",
            rocket::routes![
                routes::health,
                routes::stats,
                routes::join_room,
                routes::leave_room,
                routes::list_rooms,
                routes::list_agents,
                routes::send_message,
                routes::get_messages,
                routes::broadcast_message,
                routes::create_task,
                routes::list_tasks,
                routes::update_task,
                routes::store_memory,
                routes::get_memory,
                routes::get_notifications,
                routes::mark_notification_read,
                routes::stream,
                routes::stream_message,
                routes::list_shared,
                routes::read_shared,
                routes::write_shared,
                routes::delete_shared,
            ],
        )
}
