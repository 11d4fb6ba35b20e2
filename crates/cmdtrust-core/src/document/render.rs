//! Re-emit a document as frontmatter + body text.

use super::parser::split_list;
use super::{MetaValue, Metadata};

/// Render metadata and body back into document text.
///
/// Lists are written inline (`[a, b]`). Scalars are double-quoted when they
/// contain whitespace or would otherwise parse back as something else.
/// Inner lines of a multi-line value are indented so they read back as
/// continuation lines. An empty mapping renders the body alone.
pub fn render_document(metadata: &Metadata, body: &str) -> String {
    let mut out = String::new();

    if !metadata.is_empty() {
        out.push_str("---\n");
        for (key, value) in metadata.iter() {
            let rendered = render_value(value);
            if rendered.is_empty() {
                out.push_str(&format!("{}:\n", key));
            } else {
                out.push_str(&format!("{}: {}\n", key, rendered));
            }
        }
        out.push_str("---\n");
        if !body.is_empty() {
            out.push('\n');
        }
    }

    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }

    out
}

fn render_value(value: &MetaValue) -> String {
    let rendered = match value {
        MetaValue::List(items) => format!(
            "[{}]",
            items
                .iter()
                .map(|item| render_item(item))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        MetaValue::Text(text) if needs_quotes(text) => format!("\"{}\"", text),
        MetaValue::Text(text) => text.clone(),
    };
    rendered.replace('\n', CONTINUATION)
}

const CONTINUATION: &str = "\n  ";

fn needs_quotes(text: &str) -> bool {
    text.chars().any(char::is_whitespace)
        || text.starts_with(['[', '"', '\''])
        || text.ends_with(['"', '\''])
}

/// Quote a list item that would not split back out as itself
fn render_item(item: &str) -> String {
    if split_list(item) == [item] {
        return item.to_string();
    }
    let quote = if item.contains('"') { '\'' } else { '"' };
    format!("{quote}{item}{quote}")
}
