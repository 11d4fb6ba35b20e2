//! Hook validation: structural checks on a lifecycle hook followed by
//! pattern checks on its shell command.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::patterns::{self, find_path_traversal, find_unquoted_variable};
use super::types::{HookIssue, HookSeverity, HookValidationResult, Issue, IssueCode};
use crate::document::ParsedDocument;

/// Lifecycle events a hook can attach to
pub const KNOWN_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "Notification",
    "UserPromptSubmit",
    "Stop",
    "SubagentStop",
    "PreCompact",
    "SessionStart",
    "SessionEnd",
];

/// Timeouts above this many seconds are flagged
pub const MAX_REASONABLE_TIMEOUT_SECS: i64 = 300;

const HOOK_TYPE_COMMAND: &str = "command";
const HOOK_TYPE_PROMPT: &str = "prompt";

/// The `timeout` field as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HookTimeout {
    /// Whole seconds
    Seconds(i64),
    /// `true`/`false`; `false` disables the timeout
    Flag(bool),
    /// Anything that is not a number or boolean
    Invalid(String),
}

impl HookTimeout {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(HookTimeout::Flag(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(secs) => HookTimeout::Seconds(secs),
                None => HookTimeout::Invalid(n.to_string()),
            }),
            Value::String(s) => Some(Self::parse(s)),
            other => Some(HookTimeout::Invalid(other.to_string())),
        }
    }

    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "true" => HookTimeout::Flag(true),
            "false" => HookTimeout::Flag(false),
            _ => raw
                .parse()
                .map(HookTimeout::Seconds)
                .unwrap_or_else(|_| HookTimeout::Invalid(raw.to_string())),
        }
    }
}

/// A single hook, from a settings file or hook frontmatter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookDefinition {
    /// Lifecycle event, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Tool matcher of the enclosing group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    /// `command` or `prompt`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<HookTimeout>,
}

impl HookDefinition {
    /// A command hook
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            hook_type: Some(HOOK_TYPE_COMMAND.to_string()),
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Build from a JSON hook object. Unexpected shapes are kept as text so
    /// the validator can report them rather than failing here.
    pub fn from_value(value: &Value) -> Self {
        Self {
            event: string_field(value, "event"),
            matcher: string_field(value, "matcher"),
            hook_type: string_field(value, "type"),
            command: string_field(value, "command"),
            prompt: string_field(value, "prompt"),
            timeout: value.get("timeout").and_then(HookTimeout::from_value),
        }
    }

    /// Build from hook frontmatter (`type`, `command`, `prompt`, `timeout`,
    /// `event`, `matcher`)
    pub fn from_document(doc: &ParsedDocument) -> Self {
        let meta = &doc.metadata;
        let text = |key: &str| meta.text(key).map(str::to_string);

        let timeout = match meta.flag("timeout") {
            Some(flag) => Some(HookTimeout::Flag(flag)),
            None => meta.text("timeout").map(HookTimeout::parse),
        };

        Self {
            event: text("event"),
            matcher: text("matcher"),
            hook_type: text("type"),
            command: text("command"),
            prompt: text("prompt"),
            timeout,
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Every hook in a Claude settings value:
/// `{"hooks": {"<Event>": [{"matcher": "...", "hooks": [{...}]}]}}`.
///
/// Each hook is stamped with its event and group matcher.
pub fn hooks_from_settings(settings: &Value) -> Vec<HookDefinition> {
    let Some(events) = settings.get("hooks").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut hooks = Vec::new();
    for (event, groups) in events {
        let Some(groups) = groups.as_array() else {
            continue;
        };
        for group in groups {
            let matcher = string_field(group, "matcher");
            let Some(entries) = group.get("hooks").and_then(Value::as_array) else {
                continue;
            };
            for entry in entries {
                let mut hook = HookDefinition::from_value(entry);
                hook.event = Some(event.clone());
                hook.matcher = matcher.clone();
                hooks.push(hook);
            }
        }
    }
    hooks
}

/// Validate one hook
pub fn validate_hook(hook: &HookDefinition) -> HookValidationResult {
    let mut issues = Vec::new();

    let hook_type = hook.hook_type.as_deref().map(str::trim);

    check_event(hook, &mut issues);
    check_type(hook, hook_type, &mut issues);
    check_timeout(hook, &mut issues);

    if hook_type == Some(HOOK_TYPE_COMMAND) {
        if let Some(command) = hook.command.as_deref().filter(|c| !c.trim().is_empty()) {
            check_command_patterns(command, &mut issues);
        }
    }

    let result = HookValidationResult::from_issues(issues);
    debug!(
        event = hook.event.as_deref().unwrap_or("-"),
        valid = result.valid,
        score = %result.score,
        issues = result.issues.len(),
        "validated hook"
    );
    result
}

fn check_event(hook: &HookDefinition, issues: &mut Vec<HookIssue>) {
    let Some(event) = hook.event.as_deref() else {
        return;
    };
    if !KNOWN_EVENTS.contains(&event) {
        issues.push(Issue::new(
            HookSeverity::Warning,
            IssueCode::UnknownEvent,
            format!("Unknown hook event: {}", event),
            format!("Use one of: {}", KNOWN_EVENTS.join(", ")),
        ));
    }
}

/// `hook_type` is the trimmed `type` field; the command gate uses the same value
fn check_type(hook: &HookDefinition, hook_type: Option<&str>, issues: &mut Vec<HookIssue>) {
    match hook_type {
        None | Some("") => issues.push(Issue::new(
            HookSeverity::Error,
            IssueCode::MissingHookType,
            "Hook has no type",
            "Set `type` to \"command\" or \"prompt\"",
        )),
        Some(HOOK_TYPE_COMMAND) => {
            if is_blank(hook.command.as_deref()) {
                issues.push(Issue::new(
                    HookSeverity::Error,
                    IssueCode::MissingCommand,
                    "Command hook has no command",
                    "Set `command` to the shell command to run",
                ));
            }
        }
        Some(HOOK_TYPE_PROMPT) => {
            if is_blank(hook.prompt.as_deref()) {
                issues.push(Issue::new(
                    HookSeverity::Error,
                    IssueCode::MissingPrompt,
                    "Prompt hook has no prompt",
                    "Set `prompt` to the text sent to the model",
                ));
            }
        }
        Some(other) => issues.push(Issue::new(
            HookSeverity::Error,
            IssueCode::InvalidHookType,
            format!("Invalid hook type: {}", other),
            "Set `type` to \"command\" or \"prompt\"",
        )),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn check_timeout(hook: &HookDefinition, issues: &mut Vec<HookIssue>) {
    let (severity, message, recommendation) = match &hook.timeout {
        None | Some(HookTimeout::Flag(true)) => (
            HookSeverity::Warning,
            "No timeout set; default will be used".to_string(),
            "Set an explicit `timeout` in seconds",
        ),
        Some(HookTimeout::Flag(false)) => (
            HookSeverity::Warning,
            "Timeout is disabled; the hook can run indefinitely".to_string(),
            "Set an explicit `timeout` in seconds",
        ),
        Some(HookTimeout::Seconds(secs)) if *secs <= 0 => (
            HookSeverity::Error,
            format!("Timeout must be > 0 (got {})", secs),
            "Use a positive number of seconds",
        ),
        Some(HookTimeout::Seconds(secs)) if *secs > MAX_REASONABLE_TIMEOUT_SECS => (
            HookSeverity::Warning,
            format!("Timeout of {}s is very high", secs),
            "Keep hook timeouts at 300 seconds or less",
        ),
        Some(HookTimeout::Seconds(_)) => return,
        Some(HookTimeout::Invalid(raw)) => (
            HookSeverity::Error,
            format!("Timeout is not a number: {}", raw),
            "Use a positive number of seconds",
        ),
    };

    issues.push(Issue::new(severity, IssueCode::Timeout, message, recommendation));
}

/// Pattern checks run directly on the command string
fn check_command_patterns(command: &str, issues: &mut Vec<HookIssue>) {
    if let Some((_, var)) = find_unquoted_variable(command) {
        issues.push(Issue::new(
            HookSeverity::Warning,
            IssueCode::UnquotedVariable,
            format!("Unquoted variable {} in hook command", var),
            format!("Wrap {} in double quotes", var),
        ));
    }

    if find_path_traversal(command).is_some() {
        issues.push(Issue::new(
            HookSeverity::Warning,
            IssueCode::PathTraversal,
            "Hook command references a parent directory (../)",
            "Use absolute paths or paths inside the project",
        ));
    }

    for (pattern, _) in patterns::match_dangerous(command) {
        issues.push(Issue::new(
            HookSeverity::Error,
            pattern.code,
            format!("Dangerous command: {}", pattern.message),
            pattern.recommendation,
        ));
    }

    for (pattern, _) in patterns::match_caution(command) {
        issues.push(Issue::new(
            HookSeverity::Warning,
            pattern.code,
            pattern.message,
            pattern.recommendation,
        ));
    }
}
