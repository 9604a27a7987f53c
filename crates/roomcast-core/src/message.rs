//! Outbound message construction.

use chrono::{DateTime, Utc};
use roomcast_proto::payloads::Message;

use crate::error::RouterError;

/// Sender name used for system notices.
pub const BOT_NAME: &str = "chatBot";

/// Greeting sent to a connection right after it joins.
pub const WELCOME_TEXT: &str = "Welcome aboard!";

/// Build a [`Message`] stamped with the time of day of `wall_clock_secs`.
///
/// # Errors
///
/// - `RouterError::InvalidTimestamp` if the clock is outside the calendar range
pub fn format_message(
    sender_name: impl Into<String>,
    text: impl Into<String>,
    wall_clock_secs: u64,
) -> Result<Message, RouterError> {
    Ok(Message {
        sender_name: sender_name.into(),
        text: text.into(),
        timestamp: format_clock(wall_clock_secs)?,
    })
}

/// 12-hour UTC clock string `h:mm am|pm` for a Unix timestamp.
///
/// # Errors
///
/// - `RouterError::InvalidTimestamp` if the clock is outside the calendar range
pub fn format_clock(wall_clock_secs: u64) -> Result<String, RouterError> {
    let time = i64::try_from(wall_clock_secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(RouterError::InvalidTimestamp(wall_clock_secs))?;

    Ok(time.format("%-I:%M %P").to_string())
}

/// Notice broadcast to a room when `display_name` joins.
pub fn joined_notice(display_name: &str) -> String {
    format!("{display_name} has joined the chat!")
}

/// Notice broadcast to a room when `display_name` disconnects.
pub fn left_notice(display_name: &str) -> String {
    format!("{display_name} has left the chat!")
}
