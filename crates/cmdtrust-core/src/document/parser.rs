//! Line-based frontmatter parser.
//!
//! Only the small YAML subset that command files use is understood:
//! `key: value` scalars, continuation lines, inline `[a, b]` lists and block
//! `- item` sequences. The parser walks the text once through three states:
//!
//! ```text
//! SeekingBlockStart --"---"--> InBlock --"---"--> InBody
//!         |                       |
//!         +-- anything else       +-- end of input (unclosed)
//!             => no frontmatter       => no frontmatter
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DefinitionKind, DocumentError, MetaValue, Metadata, ParsedDocument};

const MARKER: &str = "---";

/// `key: value` where key is lowercase letters and hyphens
static KEY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z][a-z-]*):(?:[ \t]+(.*))?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingBlockStart,
    InBlock,
    InBody,
}

/// Entry being accumulated until the next key line or the closing marker
#[derive(Debug)]
struct PendingEntry {
    key: String,
    line: usize,
    inline: String,
    continuation: Vec<String>,
}

impl PendingEntry {
    fn into_value(self) -> MetaValue {
        let is_block_sequence = self.inline.is_empty()
            && !self.continuation.is_empty()
            && self
                .continuation
                .iter()
                .all(|l| l == "-" || l.starts_with("- "));

        if is_block_sequence {
            let items = self
                .continuation
                .iter()
                .map(|l| unquote(l.trim_start_matches('-').trim()).to_string())
                .filter(|item| !item.is_empty())
                .collect();
            return MetaValue::List(items);
        }

        let joined = std::iter::once(self.inline.as_str())
            .chain(self.continuation.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        parse_scalar(&joined)
    }
}

/// Accumulates `key: value` entries inside the block
#[derive(Debug, Default)]
struct BlockBuilder {
    metadata: Metadata,
    pending: Option<PendingEntry>,
}

impl BlockBuilder {
    fn feed(&mut self, line: &str, line_no: usize) {
        if let Some(caps) = KEY_LINE.captures(line) {
            self.flush();
            self.pending = Some(PendingEntry {
                key: caps[1].to_string(),
                line: line_no,
                inline: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
                continuation: Vec::new(),
            });
        } else if let Some(entry) = self.pending.as_mut() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                entry.continuation.push(trimmed.to_string());
            }
        }
        // Lines before the first key have nothing to attach to
    }

    fn flush(&mut self) {
        if let Some(entry) = self.pending.take() {
            let (key, line) = (entry.key.clone(), entry.line);
            self.metadata.insert_at_line(key, entry.into_value(), line);
        }
    }

    fn finish(mut self) -> Metadata {
        self.flush();
        self.metadata
    }
}

/// Parse a command-like document.
///
/// Never fails: a missing or unclosed block yields empty metadata and the
/// full input as the body.
pub fn parse_document(text: &str) -> ParsedDocument {
    let mut state = State::SeekingBlockStart;
    let mut builder = BlockBuilder::default();
    let mut offset = 0;
    let mut closing: Option<(usize, usize)> = None;

    for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
        let line = raw_line.trim_end_matches(['\n', '\r']);
        state = match state {
            State::SeekingBlockStart if line.trim_end() == MARKER => State::InBlock,
            State::SeekingBlockStart => break,
            State::InBlock if line.trim_end() == MARKER => {
                closing = Some((idx, offset + raw_line.len()));
                State::InBody
            }
            State::InBlock => {
                builder.feed(line, idx + 1);
                State::InBlock
            }
            State::InBody => break,
        };
        offset += raw_line.len();
    }

    let Some((closing_idx, body_offset)) = closing else {
        tracing::debug!("no frontmatter block found");
        return ParsedDocument {
            metadata: Metadata::default(),
            body: text.to_string(),
            body_line: 1,
            has_frontmatter: false,
        };
    };

    let rest = &text[body_offset..];
    let leading = &rest[..rest.len() - rest.trim_start().len()];
    let skipped_lines = leading.matches('\n').count();

    ParsedDocument {
        metadata: builder.finish(),
        body: rest.trim().to_string(),
        body_line: closing_idx + 2 + skipped_lines,
        has_frontmatter: true,
    }
}

/// Parse an agent or skill definition, which must have frontmatter with
/// every field in [`DefinitionKind::required_fields`].
pub fn parse_definition(text: &str, kind: DefinitionKind) -> Result<ParsedDocument, DocumentError> {
    let doc = parse_document(text);
    if !doc.has_frontmatter {
        return Err(DocumentError::MissingFrontmatter { kind });
    }
    if let Some(field) = kind
        .required_fields()
        .iter()
        .copied()
        .find(|field| !doc.metadata.has_value(field))
    {
        return Err(DocumentError::MissingField { kind, field });
    }
    Ok(doc)
}

fn parse_scalar(raw: &str) -> MetaValue {
    let trimmed = raw.trim();
    if is_quoted(trimmed) {
        return MetaValue::Text(trimmed[1..trimmed.len() - 1].to_string());
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        return MetaValue::List(split_list(&trimmed[1..trimmed.len() - 1]));
    }
    MetaValue::Text(trimmed.to_string())
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
}

fn unquote(s: &str) -> &str {
    if is_quoted(s) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Split on commas outside parentheses and quoted items.
///
/// `Bash(git add, git commit), Read` → `["Bash(git add, git commit)", "Read"]`
///
/// A quote only opens a quoted item at the start of that item, so an
/// apostrophe inside a grant does not swallow the rest of the list.
pub(crate) fn split_list(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if depth == 0 && inner[start..i].trim().is_empty() => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&inner[start..]);

    items
        .into_iter()
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_basic_block() {
        let doc = parse_document(
            "---\ndescription: Deploy the app\nallowed-tools: [Bash(git:*), Read]\n---\n\nRun it.\n",
        );
        assert!(doc.has_frontmatter);
        assert_eq!(doc.metadata.text("description"), Some("Deploy the app"));
        assert_eq!(doc.tool_grants(), vec!["Bash(git:*)", "Read"]);
        assert_eq!(doc.body, "Run it.");
        assert_eq!(doc.body_line, 6);
    }

    #[test]
    fn test_no_frontmatter_returns_full_text() {
        let text = "Just a prompt\nwith $1\n";
        let doc = parse_document(text);
        assert!(!doc.has_frontmatter);
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, text);
        assert_eq!(doc.body_line, 1);
    }

    #[test]
    fn test_unclosed_block_is_not_frontmatter() {
        let text = "---\ndescription: never closed\nbody";
        let doc = parse_document(text);
        assert!(!doc.has_frontmatter);
        assert!(doc.metadata.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_marker_must_be_first_line() {
        let doc = parse_document("\n---\ndescription: late\n---\nbody");
        assert!(!doc.has_frontmatter);
    }

    #[test]
    fn test_continuation_lines_join_with_newline() {
        let doc = parse_document("---\ndescription: first line\n  second line\n\n  third\nmodel: opus\n---\nbody");
        assert_eq!(
            doc.metadata.text("description"),
            Some("first line\nsecond line\nthird")
        );
        assert_eq!(doc.metadata.text("model"), Some("opus"));
    }

    #[test]
    fn test_block_sequence_becomes_list() {
        let doc = parse_document("---\nallowed-tools:\n  - Read\n  - \"Bash(ls:*)\"\n---\n");
        assert_eq!(doc.tool_grants(), vec!["Read", "Bash(ls:*)"]);
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_quoted_scalars_are_unquoted_and_never_lists() {
        let doc = parse_document("---\nargument-hint: \"[arg1] [arg2]\"\nmodel: 'sonnet'\n---\nx");
        assert_eq!(
            doc.metadata.get("argument-hint"),
            Some(&MetaValue::Text("[arg1] [arg2]".into()))
        );
        assert_eq!(doc.metadata.text("model"), Some("sonnet"));
    }

    #[test]
    fn test_inline_list_respects_parentheses() {
        let doc = parse_document("---\nallowed-tools: [Bash(git add, git commit), Write(*)]\n---\n");
        assert_eq!(doc.tool_grants(), vec!["Bash(git add, git commit)", "Write(*)"]);
    }

    #[test]
    fn test_inline_list_keeps_quoted_commas() {
        let doc = parse_document("---\nallowed-tools: [\"a, b\", Bash(don't:*), Read]\n---\n");
        assert_eq!(doc.tool_grants(), vec!["a, b", "Bash(don't:*)", "Read"]);
    }

    #[test]
    fn test_empty_inline_list() {
        let doc = parse_document("---\nallowed-tools: []\n---\n");
        assert_eq!(doc.metadata.get("allowed-tools"), Some(&MetaValue::List(vec![])));
        assert!(!doc.metadata.has_value("allowed-tools"));
    }

    #[test]
    fn test_boolean_values_exposed() {
        let doc = parse_document("---\ntimeout: false\ndisable-model-invocation: true\n---\n");
        assert_eq!(doc.metadata.flag("timeout"), Some(false));
        assert_eq!(doc.metadata.flag("disable-model-invocation"), Some(true));
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = parse_document("---\r\ndescription: Windows\r\n---\r\nBody\r\n");
        assert!(doc.has_frontmatter);
        assert_eq!(doc.metadata.text("description"), Some("Windows"));
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_uppercase_key_is_continuation() {
        let doc = parse_document("---\ndescription: a\nModel: b\n---\n");
        assert_eq!(doc.metadata.text("description"), Some("a\nModel: b"));
        assert_eq!(doc.metadata.len(), 1);
    }

    #[test]
    fn test_key_lines_record_line_numbers() {
        let doc = parse_document("---\ndescription: d\nallowed-tools: [Read]\n---\nbody");
        assert_eq!(doc.metadata.line_of("description"), Some(2));
        assert_eq!(doc.metadata.line_of("allowed-tools"), Some(3));
    }

    #[test]
    fn test_strict_parse_requires_block() {
        let err = parse_definition("You are a helper.", DefinitionKind::Agent).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingFrontmatter {
                kind: DefinitionKind::Agent
            }
        );
    }

    #[test]
    fn test_strict_parse_requires_fields() {
        let err = parse_definition("---\nname: helper\n---\nBody", DefinitionKind::Skill).unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingField {
                kind: DefinitionKind::Skill,
                field: "description"
            }
        );
        assert_eq!(
            err.to_string(),
            "skill definition is missing required field: description"
        );
    }

    #[test]
    fn test_strict_parse_accepts_complete_definition() {
        let doc = parse_definition(
            "---\nname: reviewer\ndescription: Reviews diffs\n---\nYou review code.",
            DefinitionKind::Agent,
        )
        .unwrap();
        assert_eq!(doc.metadata.text("name"), Some("reviewer"));
        assert_eq!(doc.body, "You review code.");
    }
}
