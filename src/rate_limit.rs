use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::Instant;

/// Configurable rate limit values. All read from environment variables with sensible defaults.
/// The hub has no authentication (trust is assumed among connected peers), so
/// these are the only defense against a misbehaving agent hammering the API.
///
/// Environment variables:
/// - `RATE_LIMIT_MESSAGES` — Max send/broadcast calls per minute per IP (default: 60)
/// - `RATE_LIMIT_ROOMS` — Max room joins (first-time room creation) per hour per IP (default: 10)
/// - `RATE_LIMIT_TASKS` — Max task create/update calls per minute per IP (default: 60)
/// - `RATE_LIMIT_MEMORY` — Max memory writes per minute per IP (default: 60)
pub struct RateLimitConfig {
    /// send/broadcast calls per minute per IP
    pub messages_max: usize,
    pub messages_window_secs: u64,
    /// room creations per hour per IP
    pub rooms_max: usize,
    pub rooms_window_secs: u64,
    /// task mutations per minute per IP
    pub tasks_max: usize,
    pub tasks_window_secs: u64,
    /// memory writes per minute per IP
    pub memory_max: usize,
    pub memory_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            messages_max: 60,
            messages_window_secs: 60,
            rooms_max: 10,
            rooms_window_secs: 3600,
            tasks_max: 60,
            tasks_window_secs: 60,
            memory_max: 60,
            memory_window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Create a new RateLimitConfig from environment variables, with defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("RATE_LIMIT_MESSAGES")
            && let Ok(n) = val.parse::<usize>()
        {
            config.messages_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_ROOMS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.rooms_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_TASKS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.tasks_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_MEMORY")
            && let Ok(n) = val.parse::<usize>()
        {
            config.memory_max = n;
        }

        config
    }
}

pub struct RateLimiter {
    limits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about rate limit status for a given key.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    /// Seconds until the oldest request in the window expires (i.e. a slot opens).
    /// 0 if there's remaining capacity.
    pub retry_after_secs: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            limits: Mutex::new(HashMap::new()),
        }
    }

    /// Check if a request is allowed. Returns true if allowed, false if rate limited.
    /// `key` is typically "action:ip", `max` is max requests, `window_secs` is the time window.
    pub fn check(&self, key: &str, max: usize, window_secs: u64) -> bool {
        self.check_with_info(key, max, window_secs).allowed
    }

    /// Check rate limit and return detailed info for response headers.
    pub fn check_with_info(&self, key: &str, max: usize, window_secs: u64) -> RateLimitInfo {
        let mut limits = self.limits.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let window = std::time::Duration::from_secs(window_secs);

        let entries = limits.entry(key.to_string()).or_default();

        // Remove expired entries
        entries.retain(|t| now.duration_since(*t) < window);

        if entries.len() >= max {
            // Calculate when the oldest entry will expire
            let oldest = match entries.iter().min() {
                Some(t) => t,
                None => return RateLimitInfo { allowed: false, remaining: 0, limit: max, retry_after_secs: 1 },
            };
            let elapsed = now.duration_since(*oldest);
            let retry_after = if elapsed < window {
                (window - elapsed).as_secs() + 1 // +1 to ensure the slot is actually open
            } else {
                1
            };

            return RateLimitInfo {
                allowed: false,
                limit: max,
                remaining: 0,
                retry_after_secs: retry_after,
            };
        }

        entries.push(now);
        let remaining = max - entries.len();

        RateLimitInfo {
            allowed: true,
            limit: max,
            remaining,
            retry_after_secs: 0,
        }
    }
}
