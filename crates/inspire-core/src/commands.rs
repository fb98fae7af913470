//! Binding of declared inputs and invocation of the built-in handlers.

use crate::{
    domain::UserId,
    errors::Error,
    help, moderators,
    permissions::{privilege_level, Privilege},
    quotes::{self, QuoteStore},
    registry::{CommandKind, Param},
    schema::{CommandSchema, CommandSpec, MessageKey},
    users::UserRegistry,
    Result,
};

/// Inputs bound for one invocation, by the names the schema declares.
///
/// Anything not declared stays unbound; asking a handler for it is a usage
/// error rather than a silent default.
#[derive(Clone, Debug, Default)]
pub struct BoundArgs {
    user_id: Option<UserId>,
    tokens: Option<Vec<String>>,
    mentions: Option<Vec<UserId>>,
}

impl BoundArgs {
    pub fn bind(
        declared: &[Param],
        user_id: UserId,
        tokens: &[String],
        mentions: &[UserId],
    ) -> Self {
        let mut args = Self::default();
        for param in declared {
            match param {
                Param::UserId => args.user_id = Some(user_id),
                Param::Tokens => args.tokens = Some(tokens.to_vec()),
                Param::Mentions => args.mentions = Some(mentions.to_vec()),
            }
        }
        args
    }

    pub fn user_id(&self) -> Result<UserId> {
        self.user_id.ok_or_else(|| unbound(Param::UserId))
    }

    pub fn tokens(&self) -> Result<&[String]> {
        self.tokens.as_deref().ok_or_else(|| unbound(Param::Tokens))
    }

    pub fn mentions(&self) -> Result<&[UserId]> {
        self.mentions.as_deref().ok_or_else(|| unbound(Param::Mentions))
    }
}

fn unbound(param: Param) -> Error {
    Error::Usage(format!("parameter {} is not bound", param.as_str()))
}

/// Everything a handler may touch during one dispatch.
pub struct CommandContext<'a> {
    pub schema: &'a CommandSchema,
    pub users: &'a UserRegistry,
    pub quotes: &'a QuoteStore,
    pub kind: CommandKind,
    pub spec: &'a CommandSpec,
}

impl CommandContext<'_> {
    pub fn required_privilege(&self) -> Privilege {
        self.spec.effective_privilege(self.kind)
    }

    pub async fn is_authorized(&self, user_id: UserId) -> Result<bool> {
        let required = self.required_privilege();
        if required == Privilege::None {
            return Ok(true);
        }
        Ok(privilege_level(self.users, user_id).await? >= required)
    }

    /// Authorization for handlers that only bind `user_id` when the schema
    /// gates them.
    pub async fn is_authorized_bound(&self, args: &BoundArgs) -> Result<bool> {
        if self.required_privilege() == Privilege::None {
            return Ok(true);
        }
        self.is_authorized(args.user_id()?).await
    }

    pub fn reply(&self, key: MessageKey) -> Option<String> {
        Some(self.schema.message(key))
    }
}

pub async fn invoke(ctx: &CommandContext<'_>, args: &BoundArgs) -> Result<Option<String>> {
    match ctx.kind {
        CommandKind::Help => {
            if !ctx.is_authorized_bound(args).await? {
                return Ok(ctx.reply(MessageKey::NoPrivileges));
            }
            Ok(Some(help::help(ctx.schema, args.tokens()?)))
        }
        CommandKind::AddQuote => {
            quotes::add_quote(ctx, args.user_id()?, args.tokens()?).await
        }
        CommandKind::RandomQuote => {
            if !ctx.is_authorized_bound(args).await? {
                return Ok(ctx.reply(MessageKey::NoPrivileges));
            }
            quotes::random_quote(ctx.quotes).await.map(Some)
        }
        CommandKind::GrantModerator => {
            moderators::grant_moderator(ctx, args.user_id()?, args.mentions()?).await
        }
        CommandKind::RevokeModerator => {
            moderators::revoke_moderator(ctx, args.user_id()?, args.mentions()?).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_only_declared_inputs() {
        let tokens = vec!["quote".to_string(), "x".to_string()];
        let args = BoundArgs::bind(&[Param::Tokens], UserId(1), &tokens, &[UserId(2)]);
        assert_eq!(args.tokens().unwrap(), tokens.as_slice());
        assert!(matches!(args.user_id(), Err(Error::Usage(_))));
        assert!(matches!(args.mentions(), Err(Error::Usage(_))));
    }

    #[test]
    fn no_declared_inputs_binds_nothing() {
        let args = BoundArgs::bind(&[], UserId(1), &["inspire".to_string()], &[UserId(2)]);
        assert!(args.user_id().is_err());
        assert!(args.tokens().is_err());
        assert!(args.mentions().is_err());
    }

    #[test]
    fn binds_everything_declared() {
        let args = BoundArgs::bind(
            &[Param::UserId, Param::Mentions],
            UserId(1),
            &[],
            &[UserId(2), UserId(3)],
        );
        assert_eq!(args.user_id().unwrap(), UserId(1));
        assert_eq!(args.mentions().unwrap(), &[UserId(2), UserId(3)]);
    }
}
