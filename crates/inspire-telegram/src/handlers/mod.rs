//! Telegram update handlers.
//!
//! Only text messages can carry commands; everything else is ignored.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod text;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.text().is_none() || msg.from().is_none() {
        return Ok(());
    }
    text::handle_text(bot, msg, state).await
}
