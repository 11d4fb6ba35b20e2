//! Trust scoring for slash-commands and validation of lifecycle hooks.
//!
//! Detects missing metadata, unsafe shell execution and over-broad tool grants.

pub mod hooks;
pub mod patterns;
pub mod rules;
pub mod scanner;
pub mod types;

pub use hooks::{hooks_from_settings, validate_hook, HookDefinition, HookTimeout};
pub use scanner::{scan_command, SecurityScanner};
pub use types::{
    HookIssue, HookScore, HookSeverity, HookValidationResult, Issue, IssueCode, ScanResult,
    SecurityIssue, Severity, TrustLevel,
};
