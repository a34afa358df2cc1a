//! Context block assembly for grounded prompts.

use crate::document::Document;

/// Label each retrieved document and stack them in retrieval order.
///
/// Every document contributes a `[Document i]` line (1-based), its content
/// and an empty line.
pub fn build_context<'a, I>(documents: I) -> String
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut parts = Vec::new();
    for (i, doc) in documents.into_iter().enumerate() {
        parts.push(format!("[Document {}]", i + 1));
        parts.push(doc.content.clone());
        parts.push(String::new());
    }
    parts.join("\n")
}

/// Shorten text for display, breaking at a word boundary when possible.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let truncated = &text[..cut];

    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", &truncated[..last_space]),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;

    #[test]
    fn test_context_layout() {
        let docs = vec![
            Document::new("first chunk", DocumentMetadata::new("a.txt", 0)),
            Document::new("second chunk", DocumentMetadata::new("b.txt", 3)),
        ];

        assert_eq!(
            build_context(&docs),
            "[Document 1]\nfirst chunk\n\n[Document 2]\nsecond chunk\n"
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(build_context(&Vec::<Document>::new()), "");
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("short", 10), "short");
        assert_eq!(truncate_snippet("hello brave new world", 12), "hello brave...");
        assert_eq!(truncate_snippet("ééééé", 3), "ééé...");
    }
}
