//! Messenger-facing types (Telegram today).

pub mod port;
pub mod types;
