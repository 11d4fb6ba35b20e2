//! Individual command rule checks.
//!
//! Each function inspects a parsed command and pushes any findings onto the
//! `issues` vector. Scoring is left to the scanner, which deducts
//! [`Severity::penalty`] per issue.

use super::patterns::{
    self, find_path_traversal, find_unquoted_variable, has_bash_grant, wildcard_grants,
    BASH_WILDCARD,
};
use super::types::{Issue, IssueCode, SecurityIssue, Severity};
use crate::document::syntax::{self, execution_blocks, ExecutionBlock};
use crate::document::{ParsedDocument, ALLOWED_TOOLS, ARGUMENT_HINT, DESCRIPTION};

// =========================================================
// Metadata
// =========================================================

/// Missing `description` (Medium)
pub fn check_description(doc: &ParsedDocument, issues: &mut Vec<SecurityIssue>) {
    if doc.metadata.has_value(DESCRIPTION) {
        return;
    }
    issues.push(
        Issue::new(
            Severity::Medium,
            IssueCode::MissingDescription,
            "Command has no description",
            "Add a `description` field so users know what the command does before running it",
        )
        .auto_fixable(),
    );
}

/// Positional arguments used without an `argument-hint` (Medium)
pub fn check_argument_hint(doc: &ParsedDocument, issues: &mut Vec<SecurityIssue>) {
    if doc.metadata.has_value(ARGUMENT_HINT) {
        return;
    }
    let Some(offset) = syntax::first_positional_arg(&doc.body) else {
        return;
    };
    issues.push(
        Issue::new(
            Severity::Medium,
            IssueCode::MissingArgumentHint,
            "Command takes arguments but has no argument-hint",
            "Add an `argument-hint` field describing each positional argument",
        )
        .at_line(Some(doc.line_of_body_offset(offset)))
        .auto_fixable(),
    );
}

// =========================================================
// Inline shell execution
// =========================================================

/// Checks that only apply when the body runs shell commands via `` !`...` ``.
///
/// Missing Bash grant, unquoted variables and dangerous patterns are Critical;
/// `Bash(*)` is High. Caution patterns and path traversal are reported as Low
/// advisories that do not move the score.
pub fn check_execution_blocks(doc: &ParsedDocument, issues: &mut Vec<SecurityIssue>) {
    let blocks = execution_blocks(&doc.body);
    let Some(first) = blocks.first() else {
        return;
    };

    let grants = doc.tool_grants();

    if !has_bash_grant(&grants) {
        issues.push(
            Issue::new(
                Severity::Critical,
                IssueCode::MissingBashPermission,
                "Command executes shell code but does not declare a Bash permission",
                "Add a scoped grant such as `allowed-tools: [Bash(git:*)]` covering the commands it runs",
            )
            .at_line(Some(doc.line_of_body_offset(first.start))),
        );
    }

    check_unquoted_variables(doc, &blocks, issues);
    check_dangerous_patterns(doc, &blocks, issues);

    if grants.iter().any(|g| g == BASH_WILDCARD) {
        issues.push(
            Issue::new(
                Severity::High,
                IssueCode::WildcardPermission,
                "Bash(*) lets the command run any shell command",
                "Replace Bash(*) with grants for the specific commands used",
            )
            .at_line(doc.metadata.line_of(ALLOWED_TOOLS))
            .auto_fixable(),
        );
    }

    check_caution_patterns(doc, &blocks, issues);
}

/// One finding for the first unquoted variable across all blocks
fn check_unquoted_variables(
    doc: &ParsedDocument,
    blocks: &[ExecutionBlock<'_>],
    issues: &mut Vec<SecurityIssue>,
) {
    let found = blocks.iter().find_map(|block| {
        find_unquoted_variable(block.command).map(|(offset, var)| (block, offset, var))
    });

    if let Some((block, offset, var)) = found {
        let mut issue = Issue::new(
            Severity::Critical,
            IssueCode::UnquotedVariable,
            format!("Unquoted variable {} in shell execution", var),
            format!(
                "Wrap {} in double quotes so arguments cannot inject extra shell words",
                var
            ),
        )
        .at_line(Some(doc.line_of_body_offset(block.command_start + offset)));
        // The fixer only quotes `$1`..`$9` and `$ARGUMENTS`
        issue.auto_fixable = syntax::is_positional_arg_at(block.command, offset);
        issues.push(issue);
    }
}

/// One finding per dangerous pattern matched in any block
fn check_dangerous_patterns(
    doc: &ParsedDocument,
    blocks: &[ExecutionBlock<'_>],
    issues: &mut Vec<SecurityIssue>,
) {
    for compiled in patterns::dangerous_patterns() {
        let hit = blocks
            .iter()
            .find_map(|block| compiled.find(block.command).map(|offset| (block, offset)));

        if let Some((block, offset)) = hit {
            let pattern = compiled.pattern;
            issues.push(
                Issue::new(
                    Severity::Critical,
                    pattern.code,
                    format!("Dangerous command: {}", pattern.message),
                    pattern.recommendation,
                )
                .at_line(Some(doc.line_of_body_offset(block.command_start + offset))),
            );
        }
    }
}

/// Low advisories for caution patterns and path traversal
fn check_caution_patterns(
    doc: &ParsedDocument,
    blocks: &[ExecutionBlock<'_>],
    issues: &mut Vec<SecurityIssue>,
) {
    for compiled in patterns::caution_patterns() {
        let hit = blocks
            .iter()
            .find_map(|block| compiled.find(block.command).map(|offset| (block, offset)));

        if let Some((block, offset)) = hit {
            let pattern = compiled.pattern;
            issues.push(
                Issue::new(
                    pattern.severity,
                    pattern.code,
                    pattern.message,
                    pattern.recommendation,
                )
                .at_line(Some(doc.line_of_body_offset(block.command_start + offset))),
            );
        }
    }

    let traversal = blocks
        .iter()
        .find_map(|block| find_path_traversal(block.command).map(|offset| (block, offset)));

    if let Some((block, offset)) = traversal {
        issues.push(
            Issue::new(
                Severity::Low,
                IssueCode::PathTraversal,
                "Shell execution references a parent directory (../)",
                "Keep file access inside the project directory",
            )
            .at_line(Some(doc.line_of_body_offset(block.command_start + offset))),
        );
    }
}

// =========================================================
// Tool grants
// =========================================================

/// `Write(*)` and `Edit(*)` grants (High each), regardless of shell use
pub fn check_file_wildcards(doc: &ParsedDocument, issues: &mut Vec<SecurityIssue>) {
    let grants = doc.tool_grants();
    for wildcard in wildcard_grants(&grants) {
        if wildcard != BASH_WILDCARD {
            issues.push(
                Issue::new(
                    Severity::High,
                    IssueCode::WildcardPermission,
                    format!("{} lets the command modify any file", wildcard),
                    format!("Scope {} to the directories the command needs", wildcard),
                )
                .at_line(doc.metadata.line_of(ALLOWED_TOOLS))
                .auto_fixable(),
            );
        }
    }
}

// =========================================================
// Convenience: run all command rules
// =========================================================

/// Run every command rule in scoring order
pub fn check_all_command_rules(doc: &ParsedDocument, issues: &mut Vec<SecurityIssue>) {
    check_description(doc, issues);
    check_argument_hint(doc, issues);
    check_execution_blocks(doc, issues);
    check_file_wildcards(doc, issues);
}
