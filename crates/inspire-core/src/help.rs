use crate::{
    formatting::literal_block, permissions::Privilege, registry::CommandKind,
    schema::CommandSchema,
};

const HELP: &str = "help";

/// Describe the command named by the second token, or `help` itself when
/// there is none or it is not a known alias.
pub fn help(schema: &CommandSchema, tokens: &[String]) -> String {
    let canonical = tokens
        .get(1)
        .and_then(|t| schema.resolve(t))
        .unwrap_or(HELP);
    describe(schema, canonical)
}

fn describe(schema: &CommandSchema, canonical: &str) -> String {
    let index = schema.aliases();
    let all = index.canonical_names().collect::<Vec<_>>().join(", ");

    let Some(spec) = schema.command(canonical) else {
        return literal_block([format!("commands: {all}")]);
    };

    let required = CommandKind::from_name(canonical)
        .map(|kind| spec.effective_privilege(kind))
        .unwrap_or_else(|| spec.required_privilege());

    let aliases = index.aliases_of(canonical);
    let aliases = if aliases.is_empty() {
        "none".to_string()
    } else {
        aliases.join(", ")
    };

    literal_block([
        format!("{canonical}: {}", spec.description),
        format!("usage: {}{}", schema.prefix(), spec.usage),
        format!("aliases: {aliases}"),
        format!("commands: {all}"),
        format!("requires moderator: {}", yes_no(required == Privilege::Moderator)),
        format!("requires admin: {}", yes_no(required == Privilege::Admin)),
    ])
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::{sample, SAMPLE};

    fn toks(s: &[&str]) -> Vec<String> {
        s.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn describes_resolved_alias() {
        let schema = sample();
        let out = help(&schema, &toks(&["help", "q"]));
        assert!(out.contains("quote: Store a quote"));
        assert!(out.contains("usage: !quote \"text\" \"author\""));
        assert!(out.contains("aliases: q, addquote"));
        assert!(out.contains("commands: help, inspire, mod, quote, unmod"));
        assert!(out.contains("requires moderator: yes"));
        assert!(out.contains("requires admin: no"));
    }

    #[test]
    fn falls_back_to_help_itself() {
        let schema = sample();
        let own = help(&schema, &toks(&["help"]));
        assert!(own.contains("help: Describe a command"));
        assert_eq!(help(&schema, &toks(&["help", "bogus"])), own);
        assert_eq!(help(&schema, &[]), own);
    }

    #[test]
    fn reports_the_privilege_the_handler_enforces() {
        let raw = SAMPLE.replace("requires-moderator = true\n", "");
        let schema = CommandSchema::from_toml_str(&raw).unwrap();
        assert!(!schema.command("quote").unwrap().requires_moderator);

        let out = help(&schema, &toks(&["help", "quote"]));
        assert!(out.contains("requires moderator: yes"));
        assert!(out.contains("requires admin: no"));

        let out = help(&schema, &toks(&["help", "inspire"]));
        assert!(out.contains("requires moderator: no"));
        assert!(out.contains("requires admin: no"));
    }
}
