use crate::domain::{ChatId, UserId};

/// A chat message as seen by the dispatcher.
///
/// Platform-specific fields stay in the adapter.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub sender: UserId,
    pub text: String,
    /// Users referenced by the message, in the order they appear.
    pub mentions: Vec<UserId>,
}

impl InboundMessage {
    pub fn new(chat_id: ChatId, sender: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender,
            text: text.into(),
            mentions: Vec::new(),
        }
    }

    pub fn with_mentions(mut self, mentions: Vec<UserId>) -> Self {
        self.mentions = mentions;
        self
    }
}

/// Limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}
