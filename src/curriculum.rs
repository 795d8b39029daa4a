//! Curriculum document handling.
//!
//! A curriculum is a user-supplied markdown file whose text is prepended (as
//! a bounded excerpt) to later chat prompts to steer mentor responses.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// How much curriculum text is prepended to each augmented chat message.
pub const EXCERPT_CHARS: usize = 2000;

/// Whether a filename has a markdown extension.
#[must_use]
pub fn is_markdown(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
}

/// Extract the curriculum title: the first top-level heading, or the
/// fallback (typically the filename) when the document has none.
#[must_use]
pub fn extract_title(content: &str, fallback: &str) -> String {
    let mut in_h1 = false;
    let mut title = String::new();

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading { level, .. }) if level == HeadingLevel::H1 => {
                in_h1 = true;
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if !title.trim().is_empty() {
                    return title.trim().to_string();
                }
                in_h1 = false;
                title.clear();
            }
            Event::Text(text) | Event::Code(text) if in_h1 => {
                title.push_str(&text);
            }
            _ => {}
        }
    }

    fallback.to_string()
}

/// A char-boundary-safe prefix of the curriculum used for prompt context.
#[must_use]
pub fn excerpt(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}
