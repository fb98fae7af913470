use std::sync::Arc;

use teloxide::{prelude::*, types::MessageEntityKind};
use tracing::{debug, error, warn};

use inspire_core::{
    domain::{ChatId, UserId},
    formatting::{reply_to_html, split_html},
    messaging::types::InboundMessage,
};

use crate::router::AppState;

pub async fn handle_text(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    let sender = UserId(user.id.0 as i64);

    let entity_users = msg
        .entities()
        .unwrap_or_default()
        .iter()
        .filter_map(|e| match &e.kind {
            MessageEntityKind::TextMention { user } => Some(user.id.0 as i64),
            _ => None,
        });
    let reply_author = msg
        .reply_to_message()
        .and_then(|m| m.from())
        .map(|u| u.id.0 as i64);
    let mentions = collect_mentions(entity_users, reply_author);

    let inbound = InboundMessage::new(chat_id, sender, text).with_mentions(mentions);

    let reply = {
        let _guard = state.dispatch_lock.acquire().await;
        state.dispatcher.dispatch(&inbound).await
    };

    let reply = match reply {
        Ok(Some(reply)) => reply,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(chat_id = chat_id.0, user_id = sender.0, error = %e, "dispatch failed");
            return Ok(());
        }
    };

    let limit = state.messenger.capabilities().max_message_len;
    let chunks = split_html(&reply_to_html(&reply), limit);
    debug!(chat_id = chat_id.0, chunks = chunks.len(), "sending reply");
    for chunk in chunks {
        if let Err(e) = state.messenger.send_html(chat_id, &chunk).await {
            warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
            break;
        }
    }

    Ok(())
}

/// Users named by text-mention entities in order, then the author of the
/// replied-to message. Each user appears once.
fn collect_mentions(
    entity_users: impl IntoIterator<Item = i64>,
    reply_author: Option<i64>,
) -> Vec<UserId> {
    let mut out: Vec<UserId> = Vec::new();
    for id in entity_users.into_iter().chain(reply_author) {
        let id = UserId(id);
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_then_reply_author() {
        assert_eq!(
            collect_mentions([5, 7], Some(9)),
            vec![UserId(5), UserId(7), UserId(9)]
        );
    }

    #[test]
    fn repeated_users_collapse() {
        assert_eq!(
            collect_mentions([5, 5, 7], Some(5)),
            vec![UserId(5), UserId(7)]
        );
    }

    #[test]
    fn nothing_mentioned() {
        assert!(collect_mentions(Vec::new(), None).is_empty());
        assert_eq!(collect_mentions([], Some(3)), vec![UserId(3)]);
    }
}
