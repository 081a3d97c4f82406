/// Number of lines shown when nothing in the text matches the query.
pub const DEFAULT_SNIPPET_LINES: usize = 3;

/// Maximum number of characters in a snippet before truncation.
pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 240;

/// Pick a few lines of `text` around the first hit of `query`.
///
/// The whole query is looked for first, then each query word longer than
/// two characters. Without any hit the first lines are returned. Blank
/// lines are skipped and the result is capped at
/// [`DEFAULT_SNIPPET_MAX_CHARS`] characters. Returns `None` when the text
/// has no visible content.
pub fn extract_snippet(text: &str, query: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }

    let query = query.trim().to_lowercase();
    let lowered: Vec<String> = lines.iter().map(|l| l.to_lowercase()).collect();

    let find = |needle: &str| lowered.iter().position(|l| l.contains(needle));
    let hit = (!query.is_empty())
        .then(|| find(&query))
        .flatten()
        .or_else(|| {
            query
                .split_whitespace()
                .filter(|w| w.chars().count() > 2)
                .find_map(find)
        });

    let (start, end) = match hit {
        Some(idx) => (idx.saturating_sub(1), (idx + 2).min(lines.len())),
        None => (0, DEFAULT_SNIPPET_LINES.min(lines.len())),
    };

    Some(truncate_chars(
        &lines[start..end].join(" "),
        DEFAULT_SNIPPET_MAX_CHARS,
    ))
}

/// Cut `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_around_full_query() {
        let text = "header\n\nintro\nQ3 fryer oil spend\nfooter\nmore";
        let snippet = extract_snippet(text, "fryer oil").unwrap();
        assert_eq!(snippet, "intro Q3 fryer oil spend footer");
    }

    #[test]
    fn snippet_falls_back_to_words() {
        let text = "one\ntwo\nthree\nhealth permit renewal\nfive";
        let snippet = extract_snippet(text, "east permit").unwrap();
        assert!(snippet.contains("health permit renewal"));
    }

    #[test]
    fn snippet_without_hit_returns_head() {
        let text = "line1\nline2\nline3\nline4";
        let snippet = extract_snippet(text, "zzz").unwrap();
        assert_eq!(snippet, "line1 line2 line3");
    }

    #[test]
    fn snippet_of_blank_text_is_none() {
        assert!(extract_snippet("", "query").is_none());
        assert!(extract_snippet(" \n\t\n", "query").is_none());
    }

    #[test]
    fn long_snippets_are_truncated() {
        let text = "é".repeat(500);
        let snippet = extract_snippet(&text, "é").unwrap();
        assert_eq!(
            snippet.chars().count(),
            DEFAULT_SNIPPET_MAX_CHARS + 3
        );
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn truncate_short_string_is_unchanged() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abcd", 3), "abc...");
    }
}
