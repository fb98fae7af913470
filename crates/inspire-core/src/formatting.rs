//! Reply formatting: plain bot text with ``` literal blocks → Telegram HTML.

const FENCE: &str = "```";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wrap lines in a literal (monospace) block.
pub fn literal_block<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from(FENCE);
    out.push('\n');
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out.push_str(FENCE);
    out
}

/// Render bot reply text as Telegram HTML.
///
/// Everything is escaped; ``` fenced blocks become `<pre>`. An unclosed fence
/// is kept as literal text.
pub fn reply_to_html(input: &str) -> String {
    let mut out = String::new();
    let mut rest = input;

    while let Some(start) = rest.find(FENCE) {
        let body_start = start + FENCE.len();
        let Some(end_rel) = rest[body_start..].find(FENCE) else {
            break;
        };
        out.push_str(&escape_html(&rest[..start]));

        let mut code = &rest[body_start..body_start + end_rel];
        code = code.strip_prefix('\n').unwrap_or(code);
        code = code.strip_suffix('\n').unwrap_or(code);
        out.push_str("<pre>");
        out.push_str(&escape_html(code));
        out.push_str("</pre>");

        rest = &rest[body_start + end_rel + FENCE.len()..];
    }

    out.push_str(&escape_html(rest));
    out
}

/// Split rendered HTML into chunks of at most `limit` chars, on line
/// boundaries where possible. An open `<pre>` is closed at the end of a chunk
/// and reopened at the start of the next.
pub fn split_html(html: &str, limit: usize) -> Vec<String> {
    const OPEN: &str = "<pre>";
    const CLOSE: &str = "</pre>";
    let limit = limit.max(OPEN.len() + CLOSE.len() + 1);

    if html.chars().count() <= limit {
        return vec![html.to_string()];
    }

    let mut out = Vec::new();
    let mut chunk = String::new();
    let mut chunk_len = 0usize;
    let mut in_pre = false;

    let pieces = html.split_inclusive('\n').flat_map(|line| {
        // Lines longer than a chunk are cut into char runs.
        let chars: Vec<char> = line.chars().collect();
        chars
            .chunks(limit - OPEN.len() - CLOSE.len())
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
    });

    for piece in pieces {
        let piece_len = piece.chars().count();
        let reserve = if pre_state_after(in_pre, &piece) {
            CLOSE.len()
        } else {
            0
        };
        if chunk_len > 0 && chunk_len + piece_len + reserve > limit {
            if in_pre {
                chunk.push_str(CLOSE);
            }
            out.push(std::mem::take(&mut chunk));
            chunk_len = 0;
            if in_pre {
                chunk.push_str(OPEN);
                chunk_len = OPEN.len();
            }
        }

        in_pre = pre_state_after(in_pre, &piece);
        chunk.push_str(&piece);
        chunk_len += piece_len;
    }

    if !chunk.is_empty() {
        out.push(chunk);
    }
    out
}

fn pre_state_after(mut in_pre: bool, text: &str) -> bool {
    let mut rest = text;
    loop {
        let tag = if in_pre { "</pre>" } else { "<pre>" };
        let Some(pos) = rest.find(tag) else {
            return in_pre;
        };
        in_pre = !in_pre;
        rest = &rest[pos + tag.len()..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn literal_block_fences_lines() {
        assert_eq!(literal_block(["a", "b"]), "```\na\nb\n```");
    }

    #[test]
    fn fenced_block_becomes_pre() {
        let html = reply_to_html("before\n```\n\"x < y\"\n    - me\n```\nafter");
        assert_eq!(
            html,
            "before\n<pre>&quot;x &lt; y&quot;\n    - me</pre>\nafter"
        );
    }

    #[test]
    fn unclosed_fence_is_literal() {
        assert_eq!(reply_to_html("```oops <b>"), "```oops &lt;b&gt;");
    }

    #[test]
    fn short_html_is_one_chunk() {
        assert_eq!(split_html("<pre>x</pre>", 4000), vec!["<pre>x</pre>"]);
    }

    #[test]
    fn long_pre_is_reopened_across_chunks() {
        let body = (0..40).map(|i| format!("line {i}\n")).collect::<String>();
        let html = format!("<pre>{body}</pre>");
        let chunks = split_html(&html, 60);

        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 60, "{c:?}");
            assert_eq!(c.matches("<pre>").count(), c.matches("</pre>").count());
        }
        let joined = chunks.concat().replace("</pre><pre>", "");
        assert_eq!(joined, html);
    }
}
