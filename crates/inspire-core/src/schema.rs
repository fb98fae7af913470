//! Command schema: prefix, command table and canned bot messages.
//!
//! Loaded and validated once at startup, then shared read-only.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use serde::Deserialize;
use tracing::info;

use crate::{
    alias::AliasIndex,
    errors::Error,
    permissions::Privilege,
    registry::{CommandKind, Param},
    Result,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSpec {
    #[serde(default, alias = "alias")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub parameters: Option<Vec<Param>>,
    #[serde(default)]
    pub requires_moderator: bool,
    #[serde(default)]
    pub requires_admin: bool,
    pub description: String,
    pub usage: String,
    /// Upper bound on arguments after the command token.
    #[serde(default)]
    pub max_arguments: Option<usize>,
}

impl CommandSpec {
    pub fn parameters(&self) -> &[Param] {
        self.parameters.as_deref().unwrap_or_default()
    }

    pub fn required_privilege(&self) -> Privilege {
        Privilege::required_by(self.requires_moderator, self.requires_admin)
    }

    /// The stricter of the handler's own floor and the schema flags.
    pub fn effective_privilege(&self, kind: CommandKind) -> Privilege {
        kind.min_privilege().max(self.required_privilege())
    }
}

/// Keys of the canned responses in `bot-messages`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
    NoPrivileges,
    NoCommand,
    AlreadyQuoted,
    FailedQuote,
    TooManyParameters,
    SuccessfulQuoteInsert,
    MadeUserMod,
    MakeModFail,
    RemovedUserMod,
    RemoveModFail,
    MalformedCommand,
    StoreFailure,
}

impl MessageKey {
    pub const REQUIRED: [MessageKey; 10] = [
        Self::NoPrivileges,
        Self::NoCommand,
        Self::AlreadyQuoted,
        Self::FailedQuote,
        Self::TooManyParameters,
        Self::SuccessfulQuoteInsert,
        Self::MadeUserMod,
        Self::MakeModFail,
        Self::RemovedUserMod,
        Self::RemoveModFail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoPrivileges => "no-privileges",
            Self::NoCommand => "no-command",
            Self::AlreadyQuoted => "already-quoted",
            Self::FailedQuote => "failed-quote",
            Self::TooManyParameters => "too-many-parameters",
            Self::SuccessfulQuoteInsert => "successful-quote-insert",
            Self::MadeUserMod => "made-user-mod",
            Self::MakeModFail => "make-mod-fail",
            Self::RemovedUserMod => "removed-user-mod",
            Self::RemoveModFail => "remove-mod-fail",
            Self::MalformedCommand => "malformed-command",
            Self::StoreFailure => "store-failure",
        }
    }
}

/// Reply when the store fails and `store-failure` is not configured.
pub const DEFAULT_STORE_FAILURE: &str = "Something went wrong, please try again later";

#[derive(Clone, Debug, Default)]
pub struct BotMessages(HashMap<String, String>);

impl BotMessages {
    /// Text for a required key. Presence is checked when the schema loads.
    pub fn get(&self, key: MessageKey) -> String {
        self.0.get(key.as_str()).cloned().unwrap_or_default()
    }

    pub fn get_optional(&self, key: MessageKey) -> Option<String> {
        self.0.get(key.as_str()).cloned()
    }

    pub fn store_failure(&self) -> String {
        self.get_optional(MessageKey::StoreFailure)
            .unwrap_or_else(|| DEFAULT_STORE_FAILURE.to_string())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSchema {
    command_prefix: String,
    commands: BTreeMap<String, CommandSpec>,
    bot_messages: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct CommandSchema {
    prefix: String,
    commands: BTreeMap<String, CommandSpec>,
    messages: BotMessages,
    aliases: AliasIndex,
}

impl CommandSchema {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read command schema {}: {e}", path.display()))
        })?;
        let schema = Self::from_toml_str(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => Error::Config(format!("{}: {other}", path.display())),
        })?;
        info!(
            path = %path.display(),
            commands = schema.commands.len(),
            aliases = schema.aliases.len(),
            "loaded command schema"
        );
        Ok(schema)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawSchema = toml::from_str(s)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSchema) -> Result<Self> {
        if raw.command_prefix.is_empty() {
            return Err(Error::Config("command-prefix must not be empty".to_string()));
        }
        if raw.commands.is_empty() {
            return Err(Error::Config("no commands configured".to_string()));
        }

        for (name, spec) in &raw.commands {
            let Some(kind) = CommandKind::from_name(name) else {
                let known = CommandKind::known_names().collect::<Vec<_>>().join(", ");
                return Err(Error::Config(format!(
                    "command {name} has no handler (known: {known})"
                )));
            };
            for input in kind.inputs() {
                if !spec.parameters().contains(input) {
                    return Err(Error::Config(format!(
                        "command {name} must declare parameter {}",
                        input.as_str()
                    )));
                }
            }
            let gated = spec.effective_privilege(kind) > Privilege::None;
            if gated && !spec.parameters().contains(&Param::UserId) {
                return Err(Error::Config(format!(
                    "command {name} requires privileges and must declare parameter user_id"
                )));
            }
        }

        let missing = MessageKey::REQUIRED
            .iter()
            .filter(|k| !raw.bot_messages.contains_key(k.as_str()))
            .map(|k| k.as_str())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "bot-messages is missing: {}",
                missing.join(", ")
            )));
        }

        let aliases = AliasIndex::build(&raw.commands)?;

        Ok(Self {
            prefix: raw.command_prefix,
            commands: raw.commands,
            messages: BotMessages(raw.bot_messages),
            aliases,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn command(&self, canonical: &str) -> Option<&CommandSpec> {
        self.commands.get(canonical)
    }

    pub fn commands(&self) -> &BTreeMap<String, CommandSpec> {
        &self.commands
    }

    pub fn messages(&self) -> &BotMessages {
        &self.messages
    }

    pub fn message(&self, key: MessageKey) -> String {
        self.messages.get(key)
    }

    pub fn aliases(&self) -> &AliasIndex {
        &self.aliases
    }

    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.resolve(alias)
    }
}
