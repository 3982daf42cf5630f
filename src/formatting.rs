//! Chat formatting helpers for replies

/// Discord's message length limit, leaving room for a code block wrapper
pub const MESSAGE_PAGE_LENGTH: usize = 1900;

/// Wrap text in a fenced code block
#[must_use]
pub fn code_block(text: &str, lang: &str) -> String {
    format!("```{lang}\n{text}\n```")
}

/// Render an error the way the raffle commands show parse failures
#[must_use]
pub fn error_block(kind: &str, message: impl std::fmt::Display) -> String {
    code_block(&format!("{kind}: {message}"), "yaml")
}

/// Join items as "a, b and c"
#[must_use]
pub fn humanize_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {last}", rest.join(", ")),
    }
}

/// Truncate a description for one-line listings
#[must_use]
pub fn shorten(text: &str, length: usize) -> String {
    if text.chars().count() > length {
        let cut: String = text.chars().take(length).collect();
        format!("{}...", cut.trim_end())
    } else {
        text.to_string()
    }
}

/// Split text into pages no longer than `page_length` characters,
/// preferring to break at newlines, then at spaces
#[must_use]
pub fn pagify(text: &str, page_length: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut rest = text;

    while rest.chars().count() > page_length {
        let limit = rest
            .char_indices()
            .nth(page_length)
            .map_or(rest.len(), |(index, _)| index);
        let window = &rest[..limit];
        let split = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|index| *index > 0)
            .unwrap_or(limit);

        let page = rest[..split].trim_end();
        if !page.is_empty() {
            pages.push(page.to_string());
        }
        rest = rest[split..].trim_start();
    }

    if !rest.trim().is_empty() {
        pages.push(rest.to_string());
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_list() {
        assert_eq!(humanize_list(&[]), "");
        assert_eq!(humanize_list(&["a".to_string()]), "a");
        assert_eq!(
            humanize_list(&["a".to_string(), "b".to_string()]),
            "a and b"
        );
        assert_eq!(
            humanize_list(&["a".to_string(), "b".to_string(), "c".to_string()]),
            "a, b and c"
        );
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short", 50), "short");
        assert_eq!(shorten("abcdef ghij", 7), "abcdef...");
    }

    #[test]
    fn test_pagify_breaks_at_newlines() {
        let text = "line one\nline two\nline three";
        let pages = pagify(text, 18);
        assert_eq!(pages, vec!["line one\nline two", "line three"]);
        for page in &pages {
            assert!(page.chars().count() <= 18);
        }
    }

    #[test]
    fn test_pagify_hard_split() {
        let text = "x".repeat(25);
        let pages = pagify(&text, 10);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages.concat(), text);
    }

    #[test]
    fn test_pagify_short_text() {
        assert_eq!(pagify("hello", 10), vec!["hello"]);
        assert!(pagify("", 10).is_empty());
    }

    #[test]
    fn test_error_block() {
        assert_eq!(
            error_block("MissingField", "The \"name\" key is required"),
            "```yaml\nMissingField: The \"name\" key is required\n```"
        );
    }
}
