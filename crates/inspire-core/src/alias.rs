use std::collections::{BTreeMap, HashMap};

use crate::{errors::Error, schema::CommandSpec, Result};

/// Maps every alias, canonical names included, to its canonical command.
///
/// Built once from the schema; read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct AliasIndex {
    map: HashMap<String, String>,
    by_command: BTreeMap<String, Vec<String>>,
}

impl AliasIndex {
    /// Build the index, rejecting any alias claimed by two commands.
    pub fn build(commands: &BTreeMap<String, CommandSpec>) -> Result<Self> {
        let mut idx = Self::default();

        // Canonical names first so an alias shadowing another command's name
        // is caught no matter which command is visited first.
        for name in commands.keys() {
            idx.register(name, name)?;
            idx.by_command.insert(name.clone(), Vec::new());
        }

        for (name, spec) in commands {
            for alias in &spec.aliases {
                if alias.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "command {name} declares an empty alias"
                    )));
                }
                if alias == name {
                    continue;
                }
                if idx.register(alias, name)? {
                    idx.by_command
                        .entry(name.clone())
                        .or_default()
                        .push(alias.clone());
                }
            }
        }

        Ok(idx)
    }

    /// Returns `false` when the alias was already registered to this command.
    fn register(&mut self, alias: &str, canonical: &str) -> Result<bool> {
        match self.map.get(alias) {
            Some(existing) if existing == canonical => Ok(false),
            Some(existing) => Err(Error::Config(format!(
                "alias {alias:?} of command {canonical} is already used by command {existing}"
            ))),
            None => {
                self.map.insert(alias.to_string(), canonical.to_string());
                Ok(true)
            }
        }
    }

    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.map.get(alias).map(String::as_str)
    }

    /// Declared aliases of a command in schema order, canonical name excluded.
    pub fn aliases_of(&self, canonical: &str) -> &[String] {
        self.by_command
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All canonical command names, sorted.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.by_command.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(aliases: &[&str]) -> CommandSpec {
        CommandSpec {
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            parameters: None,
            requires_moderator: false,
            requires_admin: false,
            description: String::new(),
            usage: String::new(),
            max_arguments: None,
        }
    }

    fn commands(entries: &[(&str, &[&str])]) -> BTreeMap<String, CommandSpec> {
        entries
            .iter()
            .map(|(name, aliases)| (name.to_string(), spec(aliases)))
            .collect()
    }

    #[test]
    fn every_alias_and_name_resolves() {
        let cmds = commands(&[("quote", &["q", "addquote"]), ("help", &["h", "?"])]);
        let idx = AliasIndex::build(&cmds).unwrap();

        for (name, spec) in &cmds {
            assert_eq!(idx.resolve(name), Some(name.as_str()));
            for alias in &spec.aliases {
                assert_eq!(idx.resolve(alias), Some(name.as_str()));
            }
        }
        assert_eq!(idx.resolve("nope"), None);
        assert_eq!(idx.len(), 6);
        assert_eq!(idx.canonical_names().collect::<Vec<_>>(), vec!["help", "quote"]);
        assert_eq!(idx.aliases_of("quote"), &["q".to_string(), "addquote".to_string()]);
    }

    #[test]
    fn alias_shadowing_another_command_is_rejected() {
        let cmds = commands(&[("help", &[]), ("quote", &["help"])]);
        assert!(matches!(AliasIndex::build(&cmds), Err(Error::Config(_))));

        let cmds = commands(&[("zeta", &[]), ("alpha", &["zeta"])]);
        assert!(matches!(AliasIndex::build(&cmds), Err(Error::Config(_))));
    }

    #[test]
    fn alias_shared_by_two_commands_is_rejected() {
        let cmds = commands(&[("mod", &["m"]), ("unmod", &["m"])]);
        assert!(matches!(AliasIndex::build(&cmds), Err(Error::Config(_))));
    }

    #[test]
    fn repeated_alias_on_same_command_is_harmless() {
        let cmds = commands(&[("inspire", &["i", "i", "inspire"])]);
        let idx = AliasIndex::build(&cmds).unwrap();
        assert_eq!(idx.aliases_of("inspire"), &["i".to_string()]);
        assert_eq!(idx.resolve("i"), Some("inspire"));
    }

    #[test]
    fn empty_alias_is_rejected() {
        let cmds = commands(&[("help", &[" "])]);
        assert!(AliasIndex::build(&cmds).is_err());
    }
}
