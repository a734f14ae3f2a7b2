use crate::rate_limit::RateLimitInfo;
use rocket::http::{Header, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use serde_json::json;
use std::io::Cursor;

/// Every fallible path in the hub surfaces one of these. Variants are the
/// behaviors from the error-handling design, not a 1:1 mapping onto internal
/// causes.
#[derive(Debug)]
pub enum HubError {
    NotFound(String),
    Validation(String),
    Store(String),
    Transport(String),
    RateLimited(RateLimitInfo, String),
}

impl HubError {
    pub fn not_found(what: impl Into<String>) -> Self {
        HubError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        HubError::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        HubError::Store(msg.into())
    }

    pub fn rate_limited(info: RateLimitInfo, msg: impl Into<String>) -> Self {
        HubError::RateLimited(info, msg.into())
    }

    fn status(&self) -> Status {
        match self {
            HubError::NotFound(_) => Status::NotFound,
            HubError::Validation(_) => Status::BadRequest,
            HubError::Store(_) => Status::InternalServerError,
            HubError::Transport(_) => Status::InternalServerError,
            HubError::RateLimited(..) => Status::TooManyRequests,
        }
    }

    fn message(&self) -> &str {
        match self {
            HubError::NotFound(m) | HubError::Validation(m) | HubError::Store(m) | HubError::Transport(m) => m,
            HubError::RateLimited(_, m) => m,
        }
    }
}

impl std::fmt::Display for HubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for HubError {}

impl From<rusqlite::Error> for HubError {
    fn from(e: rusqlite::Error) -> Self {
        eprintln!("⚠️  store error: {e}");
        HubError::Store(e.to_string())
    }
}

pub type HubResult<T> = Result<T, HubError>;

impl<'r> Responder<'r, 'static> for HubError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let rate_limit_info = if let HubError::RateLimited(info, _) = &self {
            Some(info.clone())
        } else {
            None
        };
        let body = json!({ "success": false, "error": self.message() }).to_string();
        let mut builder = Response::build();
        builder
            .status(status)
            .header(rocket::http::ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body));

        if let Some(info) = rate_limit_info {
            builder
                .header(Header::new("X-RateLimit-Limit", info.limit.to_string()))
                .header(Header::new("X-RateLimit-Remaining", "0"))
                .header(Header::new("X-RateLimit-Reset", info.retry_after_secs.to_string()))
                .header(Header::new("Retry-After", info.retry_after_secs.to_string()));
        }

        builder.ok()
    }
}

/// Helper for routes that want a `Json<T>` success body alongside the
/// standard error path.
pub fn ok<T: serde::Serialize>(value: T) -> Json<T> {
    Json(value)
}
