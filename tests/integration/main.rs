// Integration test suite for the agent coordination hub.
//
// Organized into focused modules by API surface; all share the common::TestClient
// for data/shared-directory lifecycle management.

mod common;

mod health_stats;
mod memory;
mod messages;
mod notifications;
mod rate_limit_config;
mod restart;
mod shared_fs;
mod stream;
mod tasks;
mod watcher;
