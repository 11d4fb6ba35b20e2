//! The individual fix transforms, applied in table order.

use super::FixDraft;
use crate::document::syntax::{
    has_execution_block, map_execution_blocks, positional_args, quote_positional_args,
    EXECUTION_PREFIX, FILE_REFERENCE_PREFIX,
};
use crate::document::{MetaValue, ALLOWED_TOOLS, ARGUMENT_HINT, DESCRIPTION};
use crate::security::patterns::{BASH_WILDCARD, EDIT_WILDCARD, WRITE_WILDCARD};

/// Grants substituted for `Bash(*)`
pub const DEFAULT_BASH_GRANTS: &[&str] = &["Bash(git:*)", "Bash(npm:*)", "Bash(ls:*)", "Bash(cat:*)"];

/// Path scope substituted into `Write(*)` and `Edit(*)`
pub const SAFE_WRITE_SCOPE: &str = "./src/**";

/// Synthesized descriptions are cut to this many characters
const MAX_DESCRIPTION_CHARS: usize = 100;

pub(crate) struct Transform {
    pub name: &'static str,
    pub apply: fn(&mut FixDraft) -> Vec<String>,
}

pub(crate) static TRANSFORMS: &[Transform] = &[
    Transform {
        name: "quote_variables",
        apply: quote_variables,
    },
    Transform {
        name: "restrict_bash_wildcard",
        apply: restrict_bash_wildcard,
    },
    Transform {
        name: "add_argument_hint",
        apply: add_argument_hint,
    },
    Transform {
        name: "add_description",
        apply: add_description,
    },
    Transform {
        name: "restrict_file_wildcards",
        apply: restrict_file_wildcards,
    },
];

/// Quote `$N`/`$ARGUMENTS` inside execution blocks
fn quote_variables(draft: &mut FixDraft) -> Vec<String> {
    if !has_execution_block(&draft.body) {
        return vec![];
    }

    let mut quoted = 0;
    let body = map_execution_blocks(&draft.body, |command| {
        let (rewritten, n) = quote_positional_args(command);
        quoted += n;
        rewritten
    });

    if quoted == 0 {
        return vec![];
    }
    draft.body = body;
    vec![format!(
        "Quoted {} unquoted variable{} in shell execution",
        quoted,
        if quoted == 1 { "" } else { "s" }
    )]
}

/// Replace `Bash(*)` with the fixed default grants
fn restrict_bash_wildcard(draft: &mut FixDraft) -> Vec<String> {
    let grants = draft.metadata.list(ALLOWED_TOOLS);
    if !grants.iter().any(|g| g == BASH_WILDCARD) {
        return vec![];
    }

    let mut restricted: Vec<String> = Vec::with_capacity(grants.len() + DEFAULT_BASH_GRANTS.len());
    for grant in grants {
        if grant == BASH_WILDCARD {
            for default in DEFAULT_BASH_GRANTS {
                if !restricted.iter().any(|g| g == default) {
                    restricted.push(default.to_string());
                }
            }
        } else if !restricted.contains(&grant) {
            restricted.push(grant);
        }
    }

    draft
        .metadata
        .insert(ALLOWED_TOOLS, MetaValue::List(restricted));
    vec![format!(
        "Restricted {} to {}",
        BASH_WILDCARD,
        DEFAULT_BASH_GRANTS.join(", ")
    )]
}

/// Add an `argument-hint` listing each positional reference
fn add_argument_hint(draft: &mut FixDraft) -> Vec<String> {
    if draft.metadata.has_value(ARGUMENT_HINT) {
        return vec![];
    }
    let args = positional_args(&draft.body);
    if args.is_empty() {
        return vec![];
    }

    let hint = args
        .into_iter()
        .map(|a| a.placeholder())
        .collect::<Vec<_>>()
        .join(" ");
    let change = format!("Added argument-hint: {}", hint);
    draft.metadata.insert(ARGUMENT_HINT, MetaValue::Text(hint));
    vec![change]
}

/// Add a `description` taken from the first prose line of the body
fn add_description(draft: &mut FixDraft) -> Vec<String> {
    if draft.metadata.has_value(DESCRIPTION) {
        return vec![];
    }
    let Some(description) = describe_body(&draft.body) else {
        return vec![];
    };

    let change = format!("Added description: {}", description);
    draft
        .metadata
        .insert(DESCRIPTION, MetaValue::Text(description));
    vec![change]
}

fn describe_body(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with(EXECUTION_PREFIX) && !line.starts_with(FILE_REFERENCE_PREFIX))
        .map(|line| line.trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .map(|line| {
            line.chars()
                .take(MAX_DESCRIPTION_CHARS)
                .collect::<String>()
                .trim_end()
                .to_string()
        })
}

/// Scope `Write(*)`/`Edit(*)` to the safe directory
fn restrict_file_wildcards(draft: &mut FixDraft) -> Vec<String> {
    let grants = draft.metadata.list(ALLOWED_TOOLS);
    let mut changes = vec![];

    for (wildcard, tool) in [(WRITE_WILDCARD, "Write"), (EDIT_WILDCARD, "Edit")] {
        if grants.iter().any(|g| g == wildcard) {
            changes.push(format!("Restricted {} to {}({})", wildcard, tool, SAFE_WRITE_SCOPE));
        }
    }
    if changes.is_empty() {
        return changes;
    }

    let mut scoped: Vec<String> = Vec::with_capacity(grants.len());
    for grant in grants {
        let grant = if grant == WRITE_WILDCARD {
            format!("Write({})", SAFE_WRITE_SCOPE)
        } else if grant == EDIT_WILDCARD {
            format!("Edit({})", SAFE_WRITE_SCOPE)
        } else {
            grant
        };
        if !scoped.contains(&grant) {
            scoped.push(grant);
        }
    }

    draft.metadata.insert(ALLOWED_TOOLS, MetaValue::List(scoped));
    changes
}
