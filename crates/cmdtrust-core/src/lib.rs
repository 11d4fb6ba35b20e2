//! Core library for cmdtrust.
//!
//! Screens Claude Code slash-commands and hook definitions before they are
//! trusted:
//!
//! - [`document`] splits raw artifact text into frontmatter metadata and a body.
//! - [`security`] holds the pattern catalog, the command scanner (trust score +
//!   trust level) and the hook validator (green/yellow/red).
//! - [`autofix`] rewrites a command to remove a fixed subset of findings.
//!
//! Every operation is a pure, synchronous string transform. The only shared
//! state is the read-only pattern catalog, so calls can run on any number of
//! threads without coordination.

pub mod autofix;
pub mod document;
pub mod security;

pub use autofix::{fix_command, AutoFixer, FixResult};
pub use document::{
    parse_definition, parse_document, render_document, DefinitionKind, DocumentError, MetaValue,
    Metadata, ParsedDocument,
};
pub use security::{
    hooks_from_settings, scan_command, validate_hook, HookDefinition, HookScore, HookSeverity,
    HookTimeout, HookValidationResult, IssueCode, ScanResult, SecurityIssue, SecurityScanner,
    Severity, TrustLevel,
};
