/// Split a message into words using shell-style quoting rules.
///
/// Single quotes are literal, double quotes only allow the `\"` and `\\`
/// escapes, and a bare backslash escapes the next character. `""` yields an
/// empty word. Returns `None` for an unterminated quote or a trailing
/// backslash.
pub fn split_words(s: &str) -> Option<Vec<String>> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut chars = s.chars();

    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            match ch {
                '\'' => in_single = false,
                other => cur.push(other),
            }
            continue;
        }

        if in_double {
            match ch {
                '"' => in_double = false,
                '\\' => {
                    let next = chars.next()?;
                    if !matches!(next, '"' | '\\') {
                        cur.push('\\');
                    }
                    cur.push(next);
                }
                other => cur.push(other),
            }
            continue;
        }

        match ch {
            '\'' => {
                in_single = true;
                in_word = true;
            }
            '"' => {
                in_double = true;
                in_word = true;
            }
            '\\' => {
                cur.push(chars.next()?);
                in_word = true;
            }
            c if c.is_whitespace() => {
                if in_word {
                    out.push(std::mem::take(&mut cur));
                    in_word = false;
                }
            }
            other => {
                cur.push(other);
                in_word = true;
            }
        }
    }

    if in_single || in_double {
        return None;
    }
    if in_word {
        out.push(cur);
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        split_words(s).unwrap()
    }

    #[test]
    fn quoted_phrases_are_one_word() {
        assert_eq!(
            words(r#"!quote "live fast" "nietzsche""#),
            vec!["!quote", "live fast", "nietzsche"]
        );
        assert_eq!(words("!q 'a b'  c"), vec!["!q", "a b", "c"]);
    }

    #[test]
    fn quotes_join_adjacent_text() {
        assert_eq!(words(r#"ab"c d"e"#), vec!["abc de"]);
    }

    #[test]
    fn escapes() {
        assert_eq!(words(r#"say \"hi\""#), vec!["say", "\"hi\""]);
        assert_eq!(words(r#""a \"b\" \n""#), vec![r#"a "b" \n"#]);
        assert_eq!(words(r"'it\s'"), vec![r"it\s"]);
        assert_eq!(words(r"a\ b"), vec!["a b"]);
    }

    #[test]
    fn double_quotes_keep_other_backslashes() {
        assert_eq!(words(r#"!quote "costs \$5" bob"#), vec!["!quote", r"costs \$5", "bob"]);
        assert_eq!(words(r#""a \`b\` \\ c""#), vec![r"a \`b\` \ c"]);
        assert_eq!(words("\"line\\\nbreak\""), vec!["line\\\nbreak"]);
    }

    #[test]
    fn empty_quotes_make_an_empty_word() {
        assert_eq!(words(r#"!quote "" x"#), vec!["!quote", "", "x"]);
    }

    #[test]
    fn hash_is_not_a_comment() {
        assert_eq!(words("#help #1"), vec!["#help", "#1"]);
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        assert!(split_words(r#"!quote "open"#).is_none());
        assert!(split_words("it's").is_none());
        assert!(split_words("trailing\\").is_none());
    }

    #[test]
    fn blank_input_has_no_words() {
        assert!(words("   ").is_empty());
    }
}
