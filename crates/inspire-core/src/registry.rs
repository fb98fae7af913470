//! Static table of built-in command handlers.
//!
//! The schema decides which of these are exposed, under which aliases, and
//! which inputs each receives. Handlers themselves are plain typed functions.

use serde::Deserialize;

use crate::permissions::Privilege;

/// A named input the dispatcher can bind for a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    UserId,
    #[serde(alias = "message")]
    Tokens,
    Mentions,
}

impl Param {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::Tokens => "tokens",
            Self::Mentions => "mentions",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Help,
    AddQuote,
    RandomQuote,
    GrantModerator,
    RevokeModerator,
}

const HANDLERS: &[(&str, CommandKind)] = &[
    ("help", CommandKind::Help),
    ("quote", CommandKind::AddQuote),
    ("inspire", CommandKind::RandomQuote),
    ("mod", CommandKind::GrantModerator),
    ("unmod", CommandKind::RevokeModerator),
];

impl CommandKind {
    pub fn from_name(name: &str) -> Option<Self> {
        HANDLERS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(self) -> &'static str {
        HANDLERS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }

    pub fn known_names() -> impl Iterator<Item = &'static str> {
        HANDLERS.iter().map(|(n, _)| *n)
    }

    /// Inputs the handler binds; the schema must declare all of them.
    pub fn inputs(self) -> &'static [Param] {
        match self {
            Self::Help => &[Param::Tokens],
            Self::AddQuote => &[Param::UserId, Param::Tokens],
            Self::RandomQuote => &[],
            Self::GrantModerator | Self::RevokeModerator => &[Param::UserId, Param::Mentions],
        }
    }

    /// Lowest privilege the handler accepts, whatever the schema says.
    pub fn min_privilege(self) -> Privilege {
        match self {
            Self::Help | Self::RandomQuote => Privilege::None,
            Self::AddQuote => Privilege::Moderator,
            Self::GrantModerator | Self::RevokeModerator => Privilege::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in CommandKind::known_names() {
            let kind = CommandKind::from_name(name).unwrap();
            assert_eq!(kind.name(), name);
        }
        assert!(CommandKind::from_name("eval").is_none());
    }

    #[test]
    fn message_is_accepted_for_tokens() {
        #[derive(Deserialize)]
        struct P {
            p: Vec<Param>,
        }
        let p: P = toml::from_str(r#"p = ["user_id", "message", "mentions"]"#).unwrap();
        assert_eq!(p.p, vec![Param::UserId, Param::Tokens, Param::Mentions]);
    }
}
