//! Message → command → reply.
//!
//! One call walks a message through prefix check, tokenization, alias
//! resolution, user bookkeeping and the handler. Nothing here suspends except
//! store calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    commands::{self, BoundArgs, CommandContext},
    errors::Error,
    messaging::types::InboundMessage,
    quotes::QuoteStore,
    registry::CommandKind,
    schema::{CommandSchema, MessageKey},
    store::DocumentStore,
    tokenize::split_words,
    users::UserRegistry,
    Result,
};

/// Tokens of a message that carries the command prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tokenized {
    NotACommand,
    Malformed,
    Tokens(Vec<String>),
}

/// Check the prefix and split the message; the prefix is removed from the
/// first token.
pub fn tokenize(prefix: &str, text: &str) -> Tokenized {
    if !text.starts_with(prefix) {
        return Tokenized::NotACommand;
    }
    let Some(mut tokens) = split_words(text) else {
        return Tokenized::Malformed;
    };
    if let Some(first) = tokens.first_mut() {
        if let Some(rest) = first.strip_prefix(prefix) {
            *first = rest.to_string();
        }
    }
    Tokenized::Tokens(tokens)
}

pub struct Dispatcher {
    schema: Arc<CommandSchema>,
    users: UserRegistry,
    quotes: QuoteStore,
}

impl Dispatcher {
    pub fn new(schema: Arc<CommandSchema>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            schema,
            users: UserRegistry::new(store.clone()),
            quotes: QuoteStore::new(store),
        }
    }

    pub fn schema(&self) -> &CommandSchema {
        &self.schema
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    /// Handle one message. `Ok(None)` means nothing should be sent.
    ///
    /// Store faults during bookkeeping or inside a handler become the
    /// `store-failure` reply.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Result<Option<String>> {
        let tokens = match tokenize(self.schema.prefix(), &msg.text) {
            Tokenized::NotACommand => return Ok(None),
            Tokenized::Malformed => {
                debug!(user_id = msg.sender.0, "unbalanced quoting in command");
                return Ok(self
                    .schema
                    .messages()
                    .get_optional(MessageKey::MalformedCommand));
            }
            Tokenized::Tokens(tokens) => tokens,
        };

        let name = tokens.first().map(String::as_str).unwrap_or_default();
        let Some(canonical) = self.schema.resolve(name) else {
            debug!(user_id = msg.sender.0, command = name, "unknown command");
            return Ok(Some(self.schema.message(MessageKey::NoCommand)));
        };

        let (Some(spec), Some(kind)) = (
            self.schema.command(canonical),
            CommandKind::from_name(canonical),
        ) else {
            return Err(Error::Config(format!(
                "alias {name} resolves to unregistered command {canonical}"
            )));
        };

        let count = match self.record_usage(msg).await {
            Ok(count) => count,
            Err(e) => {
                warn!(user_id = msg.sender.0, command = canonical, error = %e, "user bookkeeping failed");
                return Ok(Some(self.schema.messages().store_failure()));
            }
        };
        info!(
            user_id = msg.sender.0,
            command = canonical,
            num_commands = count,
            "dispatching command"
        );

        let args = BoundArgs::bind(spec.parameters(), msg.sender, &tokens, &msg.mentions);
        let ctx = CommandContext {
            schema: self.schema.as_ref(),
            users: &self.users,
            quotes: &self.quotes,
            kind,
            spec,
        };

        let reply = match commands::invoke(&ctx, &args).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(user_id = msg.sender.0, command = canonical, error = %e, "command failed");
                Some(self.schema.messages().store_failure())
            }
        };
        Ok(reply.filter(|r| !r.trim().is_empty()))
    }

    async fn record_usage(&self, msg: &InboundMessage) -> Result<u64> {
        self.users.ensure_user(msg.sender).await?;
        self.users.record_command_usage(msg.sender).await
    }
}
