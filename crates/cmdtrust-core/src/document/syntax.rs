//! Command body syntax: inline shell execution blocks and positional arguments.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Inline execution marker: a backtick block prefixed by `!`
static EXECUTION_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"!`([^`]+)`").unwrap());

/// `$1`..`$9` and `$ARGUMENTS`, not followed by further word characters
static POSITIONAL_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(ARGUMENTS|[1-9])\b").unwrap());

/// Prefix of a line that is an execution marker
pub const EXECUTION_PREFIX: &str = "!`";
/// Prefix of a line that is a file reference
pub const FILE_REFERENCE_PREFIX: char = '@';

/// One `` !`...` `` block found in a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionBlock<'a> {
    /// Byte offset of the `!` in the searched text
    pub start: usize,
    /// Byte offset of the command inside the backticks
    pub command_start: usize,
    /// The shell command between the backticks
    pub command: &'a str,
}

/// Find every inline execution block in order
pub fn execution_blocks(text: &str) -> Vec<ExecutionBlock<'_>> {
    EXECUTION_BLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let command = caps.get(1)?;
            Some(ExecutionBlock {
                start: whole.start(),
                command_start: command.start(),
                command: command.as_str(),
            })
        })
        .collect()
}

/// Whether the text contains at least one execution block
pub fn has_execution_block(text: &str) -> bool {
    EXECUTION_BLOCK.is_match(text)
}

/// Rewrite the command of every execution block, leaving the rest untouched
pub fn map_execution_blocks(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    EXECUTION_BLOCK
        .replace_all(text, |caps: &regex::Captures<'_>| format!("!`{}`", f(&caps[1])))
        .into_owned()
}

/// A positional argument reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionalArg {
    /// `$1`..`$9`
    Index(u8),
    /// `$ARGUMENTS`
    All,
}

impl PositionalArg {
    /// Placeholder token used in a synthesized `argument-hint`
    pub fn placeholder(self) -> String {
        match self {
            PositionalArg::Index(n) => format!("[arg{}]", n),
            PositionalArg::All => "[arguments]".to_string(),
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ARGUMENTS" => Some(PositionalArg::All),
            digit => digit.parse().ok().map(PositionalArg::Index),
        }
    }
}

impl fmt::Display for PositionalArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionalArg::Index(n) => write!(f, "${}", n),
            PositionalArg::All => write!(f, "$ARGUMENTS"),
        }
    }
}

/// Distinct positional references, `$1` first and `$ARGUMENTS` last
pub fn positional_args(text: &str) -> BTreeSet<PositionalArg> {
    POSITIONAL_ARG
        .captures_iter(text)
        .filter_map(|caps| PositionalArg::from_token(&caps[1]))
        .collect()
}

/// Byte offset of the first positional reference
pub fn first_positional_arg(text: &str) -> Option<usize> {
    POSITIONAL_ARG.find(text).map(|m| m.start())
}

/// Whether a positional reference starts exactly at `offset`.
///
/// `$10` and `${1}` are not positional references, so this is false for
/// their offsets.
pub fn is_positional_arg_at(text: &str, offset: usize) -> bool {
    POSITIONAL_ARG
        .find_at(text, offset)
        .is_some_and(|m| m.start() == offset)
}

/// Wrap positional references that sit outside double quotes in quotes.
///
/// Uses the same quote-parity rule as the unquoted-variable detector, so
/// already quoted references (`"$1"`, `"deploy $1 now"`) are left alone and
/// applying it twice changes nothing. Returns the rewritten command and the
/// number of references that were quoted.
pub fn quote_positional_args(command: &str) -> (String, usize) {
    let mut out = String::with_capacity(command.len() + 8);
    let mut last = 0;
    let mut quoted = 0;

    for m in POSITIONAL_ARG.find_iter(command) {
        out.push_str(&command[last..m.start()]);
        if is_inside_double_quotes(command, m.start()) {
            out.push_str(m.as_str());
        } else {
            out.push('"');
            out.push_str(m.as_str());
            out.push('"');
            quoted += 1;
        }
        last = m.end();
    }
    out.push_str(&command[last..]);

    (out, quoted)
}

/// Quote-parity heuristic: an odd number of `"` before `offset` means the
/// offset is inside a double-quoted string. Escaped and single quotes are not
/// understood.
pub fn is_inside_double_quotes(text: &str, offset: usize) -> bool {
    text[..offset].matches('"').count() % 2 == 1
}
