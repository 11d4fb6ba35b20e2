//! Text and JSON rendering of scan, fix and hook results.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cmdtrust_core::security::Issue;
use cmdtrust_core::{FixResult, HookDefinition, HookValidationResult, ScanResult};
use serde::Serialize;

/// One validated hook
#[derive(Debug, Clone, Serialize)]
pub struct HookReport {
    pub hook: HookDefinition,
    pub result: HookValidationResult,
}

/// JSON envelope wrapping every report
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    tool: &'static str,
    version: &'static str,
    generated_at: DateTime<Utc>,
    results: &'a T,
}

/// Serialize results inside the report envelope
pub fn to_json<T: Serialize>(results: &T) -> Result<String> {
    let envelope = Envelope {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now(),
        results,
    };
    serde_json::to_string_pretty(&envelope).context("Failed to serialize report")
}

fn push_issue<S: std::fmt::Display>(out: &mut String, issue: &Issue<S>) {
    let location = issue
        .line
        .map(|line| format!(" (line {})", line))
        .unwrap_or_default();
    let fixable = if issue.auto_fixable { " [fixable]" } else { "" };
    let _ = writeln!(
        out,
        "  [{}] {}{}: {}{}",
        issue.severity, issue.code, location, issue.message, fixable
    );
    let _ = writeln!(out, "      -> {}", issue.recommendation);
}

/// Scan result as text
pub fn scan_text(result: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}/100 ({})",
        result.subject_name, result.trust_score, result.trust_level
    );
    if result.is_clean() {
        let _ = writeln!(out, "  no issues");
    }
    for issue in &result.issues {
        push_issue(&mut out, issue);
    }
    out
}

/// Fix result as text. The fixed document is included unless it was
/// written back to disk.
pub fn fix_text(result: &FixResult, include_after: bool) -> String {
    let mut out = String::new();
    if !result.is_changed() {
        let _ = writeln!(out, "{}: nothing to fix", result.subject_name);
        return out;
    }

    let _ = writeln!(
        out,
        "{}: {} change(s)",
        result.subject_name,
        result.changes_applied.len()
    );
    for change in &result.changes_applied {
        let _ = writeln!(out, "  - {}", change);
    }
    if include_after {
        let _ = writeln!(out);
        out.push_str(&result.after);
        if !result.after.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Hook reports as text
pub fn hooks_text(reports: &[HookReport]) -> String {
    let mut out = String::new();
    if reports.is_empty() {
        let _ = writeln!(out, "no hooks found");
        return out;
    }

    for (index, report) in reports.iter().enumerate() {
        let hook = &report.hook;
        let label = hook
            .command
            .as_deref()
            .or(hook.prompt.as_deref())
            .unwrap_or("<empty>");
        let _ = writeln!(
            out,
            "#{} {}{}: {} ({})",
            index + 1,
            hook.event.as_deref().unwrap_or("hook"),
            hook.matcher
                .as_deref()
                .map(|m| format!(" [{}]", m))
                .unwrap_or_default(),
            report.result.score,
            if report.result.valid { "valid" } else { "invalid" }
        );
        let _ = writeln!(out, "  {}", label);
        for issue in &report.result.issues {
            push_issue(&mut out, issue);
        }
    }
    out
}
