// Defaults loaded from the environment (or a .env file read at startup).

use std::env;

// Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    pub static ref CHAT_URL: String = env::var("PARLEY_CHAT_URL").unwrap_or_else(|_| "http://127.0.0.1:8000/chat".to_string());
    // Empty means no Authorization header is sent.
    pub static ref CHAT_TOKEN: String = env::var("PARLEY_TOKEN").unwrap_or_default();
    pub static ref MESSAGE_FIELD: String = env::var("PARLEY_MESSAGE_FIELD").unwrap_or_else(|_| DEFAULT_MESSAGE_FIELD.to_string());
    pub static ref PENDING_INTERVAL_MS: u64 = env::var("PARLEY_PENDING_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PENDING_INTERVAL_MS);
}

pub const DEFAULT_MESSAGE_FIELD: &str = "message";
pub const DEFAULT_PENDING_INTERVAL_MS: u64 = 400;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Frames cycled by the pending indicator while a reply is outstanding.
pub const PENDING_FRAMES: [&str; 3] = [".", "..", "..."];
