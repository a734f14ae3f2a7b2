// Route module decomposition — each domain area in its own file.
// Shared types (request guards, rate-limit helper) live here; route functions
// in submodules, mounted from `lib.rs`.

pub mod memory;
pub mod messages;
pub mod notifications;
pub mod rooms;
pub mod shared_fs_routes;
pub mod stream;
pub mod system;
pub mod tasks;

pub use memory::*;
pub use messages::*;
pub use notifications::*;
pub use rooms::*;
pub use shared_fs_routes::*;
pub use stream::*;
pub use system::*;
pub use tasks::*;

use crate::error::HubError;
use crate::rate_limit::{RateLimitInfo, RateLimiter};
use rocket::request::{FromRequest, Outcome};
use rocket::serde::json::Json;
use rocket::Request;

/// The connecting client's address, used as the rate-limiter key. Falls back
/// to a fixed string when the transport doesn't expose one (e.g. in tests).
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = std::convert::Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip = req
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

/// Applies the sliding-window limiter for `action`/`ip`; returns a 429 with
/// `X-RateLimit-*`/`Retry-After` headers (via `HubError::RateLimited`) when
/// the window is exhausted.
pub fn enforce(limiter: &RateLimiter, action: &str, ip: &str, max: usize, window_secs: u64) -> Result<(), HubError> {
    let info: RateLimitInfo = limiter.check_with_info(&format!("{action}:{ip}"), max, window_secs);
    if !info.allowed {
        let retry_after = info.retry_after_secs;
        return Err(HubError::rate_limited(
            info,
            format!("rate limit exceeded for {action}, retry after {retry_after}s"),
        ));
    }
    Ok(())
}

#[rocket::catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": false, "error": "not found" }))
}

#[rocket::catch(429)]
pub fn too_many_requests() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": false, "error": "rate limit exceeded" }))
}
